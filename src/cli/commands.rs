use crate::app::{AppContext, Result};
use crate::cli::PublishArgs;
use crate::domain::{Credentials, FeedItem};
use crate::publisher::{PublishOptions, PublishReport};

impl From<&PublishArgs> for PublishOptions {
    fn from(args: &PublishArgs) -> Self {
        let limit = if args.one {
            Some(1)
        } else {
            PublishOptions::limit_from_count(args.number)
        };

        Self {
            dry_run: args.dry_run,
            ignore_existing: args.ignore_existing,
            limit,
        }
    }
}

/// Fetch and parse the configured feed.
pub async fn fetch_items(ctx: &AppContext) -> Result<Vec<FeedItem>> {
    let url = &ctx.config.feed.url;
    let fetched = ctx.fetcher.fetch(url).await?;
    let items = ctx.normalizer.normalize(&fetched.body)?;
    tracing::info!("Fetched {} items from {}", items.len(), url);
    Ok(items)
}

pub async fn publish(
    ctx: &AppContext,
    credentials: Credentials,
    options: &PublishOptions,
) -> Result<PublishReport> {
    let items = fetch_items(ctx).await?;

    let mut publisher = ctx.publisher(credentials);
    let report = publisher.publish(&items, options).await?;

    if options.dry_run {
        println!(
            "Dry run complete: {} would be posted, {} already posted",
            report.previewed, report.skipped
        );
    } else {
        println!(
            "Publish complete: {} posted, {} already posted",
            report.posted, report.skipped
        );
    }

    Ok(report)
}

pub async fn profile(ctx: &AppContext, credentials: Credentials) -> Result<()> {
    let mut sessions = ctx.session_manager(credentials);
    let session = sessions.ensure_session().await?;

    let profile = ctx.client.get_profile(&session).await?;
    println!("{}", serde_json::to_string_pretty(&profile)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn publish_args(argv: &[&str]) -> PublishArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Publish(args) => args,
            _ => panic!("expected publish"),
        }
    }

    #[test]
    fn test_default_is_unbounded() {
        let options = PublishOptions::from(&publish_args(&["feedsky", "publish"]));
        assert_eq!(options.limit, None);
        assert!(!options.dry_run);
        assert!(!options.ignore_existing);
    }

    #[test]
    fn test_one_caps_at_single_item() {
        let options = PublishOptions::from(&publish_args(&["feedsky", "publish", "--one"]));
        assert_eq!(options.limit, Some(1));
    }

    #[test]
    fn test_number_and_flags() {
        let options = PublishOptions::from(&publish_args(&[
            "feedsky", "publish", "--number", "3", "--dry-run", "--all",
        ]));
        assert_eq!(options.limit, Some(3));
        assert!(options.dry_run);
        assert!(options.ignore_existing);
    }

    #[test]
    fn test_negative_number_is_unbounded() {
        let options =
            PublishOptions::from(&publish_args(&["feedsky", "publish", "--number", "-1"]));
        assert_eq!(options.limit, None);
    }

    #[test]
    fn test_one_conflicts_with_number() {
        assert!(Cli::try_parse_from(["feedsky", "publish", "--one", "--number", "2"]).is_err());
    }
}
