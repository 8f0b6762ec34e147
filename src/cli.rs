use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "eaas")]
#[command(about = "Emotion-as-a-Service CLI", long_about = None)]
pub struct Cli {
    /// API username (defaults to AFFECTIVA_API_USER)
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// API password (defaults to AFFECTIVA_API_PASSWORD)
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Job service version, e.g. v1 or development
    #[arg(long, global = true)]
    pub api_version: Option<String>,

    /// Discovery endpoint override
    #[arg(long, global = true)]
    pub service_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a media file for processing
    CreateJob(CreateJobArgs),
    /// Show the current state of a job
    Status(JobArgs),
    /// Send a job back through processing
    Requeue(JobArgs),
    /// Change the classifier set of a job
    Rename(RenameArgs),
    /// List all jobs in the account
    Jobs,
    /// Download a result artifact of a completed job
    Download(DownloadArgs),
    /// Download the submitted media of a job
    DownloadInput(DownloadInputArgs),
    /// Print the session metrics of a completed job
    Metrics(JobArgs),
    /// List annotations of an entry
    Annotations(EntryArgs),
    /// Attach an annotation to an entry
    Annotate(AnnotateArgs),
}

#[derive(clap::Args, Debug)]
pub struct CreateJobArgs {
    pub media_path: PathBuf,

    /// Classifier set to run
    #[arg(long, default_value = eaas::resources::DEFAULT_JOB_NAME)]
    pub name: String,

    /// Extra multipart field as NAME=VALUE (repeatable)
    #[arg(long = "field", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,
}

#[derive(clap::Args, Debug)]
pub struct JobArgs {
    pub job_url: String,
}

#[derive(clap::Args, Debug)]
pub struct RenameArgs {
    pub job_url: String,

    #[arg(long)]
    pub name: String,
}

#[derive(clap::Args, Debug)]
pub struct DownloadArgs {
    pub job_url: String,

    #[arg(long, default_value = "application/csv")]
    pub content_type: String,

    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct DownloadInputArgs {
    pub job_url: String,

    #[arg(long)]
    pub content_type: String,

    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Local file name; wins over --add-job-id
    #[arg(long)]
    pub filename: Option<String>,

    /// Name the file EAAS_<stem>_<job-id><ext>
    #[arg(long)]
    pub add_job_id: bool,
}

#[derive(clap::Args, Debug)]
pub struct EntryArgs {
    pub entry_url: String,
}

#[derive(clap::Args, Debug)]
pub struct AnnotateArgs {
    pub entry_url: String,

    #[arg(long)]
    pub source: String,

    #[arg(long)]
    pub key: String,

    #[arg(long)]
    pub value: String,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field() {
        assert_eq!(
            parse_field("entry[data_split]=train").unwrap(),
            ("entry[data_split]".to_string(), "train".to_string())
        );
        assert_eq!(parse_field("a=b=c").unwrap().1, "b=c");
        assert!(parse_field("novalue").is_err());
        assert!(parse_field("=x").is_err());
    }

    #[test]
    fn test_parse_download_defaults() {
        let cli = Cli::parse_from(["eaas", "download", "https://x/jobs/1"]);
        match cli.command {
            Commands::Download(args) => {
                assert_eq!(args.content_type, "application/csv");
                assert_eq!(args.output_dir, PathBuf::from("."));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_credentials_after_subcommand() {
        let cli = Cli::parse_from(["eaas", "jobs", "--user", "u", "--password", "p"]);
        assert_eq!(cli.user.as_deref(), Some("u"));
        assert_eq!(cli.password.as_deref(), Some("p"));
    }
}
