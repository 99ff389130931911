//! Client for the posting service's XRPC API.

pub mod session;

pub use session::SessionManager;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use crate::app::{FeedskyError, Result};
use crate::domain::post::{CreateRecordRequest, UploadBlobResponse, POST_COLLECTION};
use crate::domain::{BlobRef, Credentials, PostRecord, Session};

pub const CREATE_SESSION: &str = "com.atproto.server.createSession";
pub const REFRESH_SESSION: &str = "com.atproto.server.refreshSession";
pub const UPLOAD_BLOB: &str = "com.atproto.repo.uploadBlob";
pub const CREATE_RECORD: &str = "com.atproto.repo.createRecord";
pub const GET_PROFILE: &str = "app.bsky.actor.getProfile";

/// Shape of a single XRPC call.
#[derive(Debug)]
pub enum XrpcRequest<'a> {
    /// Query endpoint; parameters go in the query string.
    Get { params: Vec<(&'a str, &'a str)> },
    /// Procedure endpoint with an optional JSON body.
    Post { body: Option<serde_json::Value> },
    /// Procedure endpoint taking raw bytes.
    Upload {
        content_type: &'a str,
        bytes: Vec<u8>,
    },
}

#[derive(Clone)]
pub struct BlueskyClient {
    client: Client,
    base_url: Url,
}

impl BlueskyClient {
    pub fn new(client: Client, base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { client, base_url })
    }

    fn endpoint_url(&self, nsid: &str) -> Result<Url> {
        Ok(self.base_url.join(&format!("xrpc/{}", nsid))?)
    }

    /// Perform one XRPC call and return the raw response body.
    ///
    /// Any non-success status becomes [`FeedskyError::Api`].
    pub async fn call(
        &self,
        nsid: &str,
        request: XrpcRequest<'_>,
        bearer: Option<&str>,
    ) -> Result<Vec<u8>> {
        let mut url = self.endpoint_url(nsid)?;

        let builder = match request {
            XrpcRequest::Get { params } => {
                if !params.is_empty() {
                    url.query_pairs_mut().extend_pairs(params);
                }
                self.client.get(url)
            }
            XrpcRequest::Post { body: Some(body) } => self
                .client
                .post(url)
                .header(CONTENT_TYPE, "application/json")
                .body(serde_json::to_vec(&body)?),
            XrpcRequest::Post { body: None } => self.client.post(url),
            XrpcRequest::Upload {
                content_type,
                bytes,
            } => self
                .client
                .post(url)
                .header(CONTENT_TYPE, content_type)
                .body(bytes),
        };

        let builder = match bearer {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();

        if !status.is_success() {
            let body = String::from_utf8_lossy(&body).into_owned();
            tracing::debug!(endpoint = nsid, status = status.as_u16(), %body, "XRPC call rejected");
            return Err(FeedskyError::Api {
                endpoint: nsid.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }

    pub async fn create_session(&self, credentials: &Credentials) -> Result<Session> {
        let body = json!({
            "identifier": credentials.identifier,
            "password": credentials.password,
        });

        let response = self
            .call(CREATE_SESSION, XrpcRequest::Post { body: Some(body) }, None)
            .await
            .map_err(auth_error)?;

        decode(&response).map_err(auth_error)
    }

    /// Exchange a refresh token for a brand new session.
    pub async fn refresh_session(&self, refresh_jwt: &str) -> Result<Session> {
        let response = self
            .call(
                REFRESH_SESSION,
                XrpcRequest::Post { body: None },
                Some(refresh_jwt),
            )
            .await
            .map_err(auth_error)?;

        decode(&response).map_err(auth_error)
    }

    pub async fn upload_blob(
        &self,
        session: &Session,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<BlobRef> {
        let response = self
            .call(
                UPLOAD_BLOB,
                XrpcRequest::Upload {
                    content_type,
                    bytes,
                },
                Some(&session.access_jwt),
            )
            .await
            .map_err(|e| FeedskyError::Upload(e.to_string()))?;

        let parsed: UploadBlobResponse =
            decode(&response).map_err(|e| FeedskyError::Upload(e.to_string()))?;
        Ok(parsed.blob)
    }

    /// Create a post in the session's repository. The confirmation is
    /// returned as-is.
    pub async fn create_record(
        &self,
        session: &Session,
        record: &PostRecord,
    ) -> Result<serde_json::Value> {
        let request = CreateRecordRequest {
            repo: &session.did,
            collection: POST_COLLECTION,
            record,
        };
        let body = serde_json::to_value(&request)?;

        let response = self
            .call(
                CREATE_RECORD,
                XrpcRequest::Post { body: Some(body) },
                Some(&session.access_jwt),
            )
            .await?;

        decode(&response)
    }

    pub async fn get_profile(&self, session: &Session) -> Result<serde_json::Value> {
        let response = self
            .call(
                GET_PROFILE,
                XrpcRequest::Get {
                    params: vec![("actor", session.did.as_str())],
                },
                Some(&session.access_jwt),
            )
            .await?;

        decode(&response)
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|e| FeedskyError::Format(format!("malformed response body: {}", e)))
}

/// Session exchanges report rejections and bad payloads as auth failures;
/// transport errors stay as they are.
fn auth_error(err: FeedskyError) -> FeedskyError {
    match err {
        FeedskyError::Api { .. } | FeedskyError::Format(_) => FeedskyError::Auth(err.to_string()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::http_fetcher::build_client;
    use std::time::Duration;
    use wiremock::matchers::{body_bytes, body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> BlueskyClient {
        BlueskyClient::new(build_client(Duration::from_secs(5)).unwrap(), &server.uri()).unwrap()
    }

    fn session() -> Session {
        Session {
            did: "did:plc:me".into(),
            access_jwt: "access".into(),
            refresh_jwt: "refresh".into(),
            active: true,
            handle: "me.test".into(),
            email: String::new(),
        }
    }

    #[test]
    fn test_endpoint_url_keeps_base_path() {
        let client = BlueskyClient::new(Client::new(), "https://pds.example.com/base").unwrap();
        assert_eq!(
            client.endpoint_url(CREATE_RECORD).unwrap().as_str(),
            "https://pds.example.com/base/xrpc/com.atproto.repo.createRecord"
        );
    }

    #[tokio::test]
    async fn test_create_session_sends_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.server.createSession"))
            .and(body_json(json!({"identifier": "me.test", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "did": "did:plc:me", "accessJwt": "a1", "refreshJwt": "r1", "handle": "me.test"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = test_client(&server)
            .create_session(&Credentials::new("me.test", "pw"))
            .await
            .unwrap();

        assert_eq!(session.access_jwt, "a1");
        assert_eq!(session.refresh_jwt, "r1");
    }

    #[tokio::test]
    async fn test_rejected_login_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.server.createSession"))
            .respond_with(ResponseTemplate::new(401).set_body_string("AuthenticationRequired"))
            .mount(&server)
            .await;

        let err = test_client(&server)
            .create_session(&Credentials::new("me.test", "bad"))
            .await
            .unwrap_err();

        assert!(matches!(err, FeedskyError::Auth(_)));
    }

    #[tokio::test]
    async fn test_malformed_refresh_body_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.server.refreshSession"))
            .and(header("authorization", "Bearer refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let err = test_client(&server)
            .refresh_session("refresh")
            .await
            .unwrap_err();

        assert!(matches!(err, FeedskyError::Auth(_)));
    }

    #[tokio::test]
    async fn test_upload_blob_forwards_bytes_and_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.repo.uploadBlob"))
            .and(header("content-type", "image/png"))
            .and(header("authorization", "Bearer access"))
            .and(body_bytes(b"PNGDATA".to_vec()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "blob": {"$type": "blob", "ref": {"$link": "bafk"}, "mimeType": "image/png", "size": 7}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let blob = test_client(&server)
            .upload_blob(&session(), "image/png", b"PNGDATA".to_vec())
            .await
            .unwrap();

        assert_eq!(blob.cid.link, "bafk");
        assert_eq!(blob.size, 7);
    }

    #[tokio::test]
    async fn test_upload_failure_is_upload_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.repo.uploadBlob"))
            .respond_with(ResponseTemplate::new(413))
            .mount(&server)
            .await;

        let err = test_client(&server)
            .upload_blob(&session(), "image/png", vec![0; 8])
            .await
            .unwrap_err();

        assert!(matches!(err, FeedskyError::Upload(_)));
    }

    #[tokio::test]
    async fn test_get_profile_uses_query_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/xrpc/app.bsky.actor.getProfile"))
            .and(query_param("actor", "did:plc:me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"handle": "me.test"})))
            .expect(1)
            .mount(&server)
            .await;

        let profile = test_client(&server).get_profile(&session()).await.unwrap();

        assert_eq!(profile["handle"], "me.test");
    }
}
