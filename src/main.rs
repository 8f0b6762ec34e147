mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use eaas::config::Config;
use eaas::{AnnotationData, EmotionApi, InputNaming, JobUpdate, NewJob};
use serde::Serialize;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    let cli = Cli::parse();

    let mut config = Config::load()?.with_credentials(cli.user.as_deref(), cli.password.as_deref());
    if let Some(version) = cli.api_version {
        config.service.version = version;
    }
    if let Some(url) = cli.service_url {
        config.service.discovery_url = url;
    }
    eaas::observability::init(&config.telemetry.log_filter);

    let api = EmotionApi::from_config(&config).await?;

    match cli.command {
        Commands::CreateJob(args) => {
            let request = NewJob::builder()
                .media_path(args.media_path)
                .name(args.name)
                .extra_fields(args.fields)
                .build();
            print_json(api.create_job(&request).await?.details())?;
        }
        Commands::Status(args) => print_json(api.query_job(&args.job_url).await?.details())?,
        Commands::Requeue(args) => print_json(api.requeue_job(&args.job_url).await?.details())?,
        Commands::Rename(args) => {
            let update = JobUpdate {
                name: Some(args.name),
            };
            print_json(api.update_job(&args.job_url, &update).await?.details())?;
        }
        Commands::Jobs => print_json(&api.jobs().await?)?,
        Commands::Download(args) => {
            let path = api
                .download_results(&args.job_url, &args.content_type, &args.output_dir)
                .await?;
            println!("{}", path.display());
        }
        Commands::DownloadInput(args) => {
            let naming = InputNaming {
                filename: args.filename,
                add_job_id: args.add_job_id,
            };
            let path = api
                .download_input_media(&args.job_url, &args.content_type, &args.output_dir, &naming)
                .await?;
            println!("{}", path.display());
        }
        Commands::Metrics(args) => print_json(&api.session_metrics(&args.job_url).await?)?,
        Commands::Annotations(args) => {
            let entry = api.entry(&args.entry_url).await?;
            let listed = entry.annotations().await?;
            let annotations: Vec<&AnnotationData> = listed.iter().map(|a| a.data()).collect();
            print_json(&annotations)?;
        }
        Commands::Annotate(args) => {
            let entry = api.entry(&args.entry_url).await?;
            entry
                .add_annotations(&[AnnotationData::new(args.source, args.key, args.value)])
                .await?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AnyError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
