use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use showhouse::ImageCrawler;
use showhouse::blog;

#[derive(Parser)]
#[command(name = "showhouse")]
#[command(about = "Showhouse landing-site tools: image crawler and blog utilities", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Download every image a page references and write a JSON manifest
    Crawl {
        #[arg(help = "URL of the page to crawl for images")]
        url: String,

        #[arg(
            long = "out-dir",
            default_value = "crawled-images",
            help = "Directory for downloaded images and the manifest"
        )]
        out_dir: PathBuf,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// List generated blog posts
    Posts {
        #[arg(
            long = "blog-dir",
            default_value = "blog",
            help = "Directory containing generated posts"
        )]
        blog_dir: PathBuf,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    match cli.command {
        Commands::Crawl {
            url,
            out_dir,
            format,
        } => {
            let crawler = ImageCrawler::new(&out_dir).unwrap_or_else(|e| {
                log::error!("Error creating crawler: {}", e);
                process::exit(1);
            });

            let report = crawler.crawl(&url).await.unwrap_or_else(|e| {
                log::error!("Error crawling {}: {}", url, e);
                process::exit(1);
            });

            match format {
                OutputFormat::Json => serialize_json(&report.records),
                OutputFormat::Text => {
                    if report.records.is_empty() {
                        println!("No images downloaded.");
                    } else {
                        for (i, record) in report.records.iter().enumerate() {
                            println!("{:>3}. {}", i + 1, record);
                        }
                    }
                    print!("{}", report);
                }
            }
        }

        Commands::Posts { blog_dir, format } => {
            let posts = blog::list_posts(&blog_dir).unwrap_or_else(|e| {
                log::error!("Error listing posts in {}: {}", blog_dir.display(), e);
                process::exit(1);
            });

            match format {
                OutputFormat::Json => serialize_json(&posts),
                OutputFormat::Text => {
                    if posts.is_empty() {
                        println!("No posts to display.");
                    } else {
                        for (i, post) in posts.iter().enumerate() {
                            println!(
                                "{:>3}. {} — {} (created {})",
                                i + 1,
                                post.file_name,
                                post.title,
                                post.created
                            );
                        }
                    }
                }
            }
        }
    }
}
