use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "imagecat", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate tasks from a pipeline document.
    Run(RunArgs),
    /// Load an image file and list its layers.
    Info(InfoArgs),
    /// List the available operators.
    Operators,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Input pipeline JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Task to evaluate; may be repeated. Defaults to every task no other task consumes.
    #[arg(long = "task")]
    tasks: Vec<String>,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Input image file.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Info(args) => cmd_info(args),
        Command::Operators => {
            for op in imagecat::Operator::ALL {
                println!("{op}");
            }
            Ok(())
        }
    }
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let pipeline = imagecat::Pipeline::from_path(&args.in_path)
        .with_context(|| format!("load pipeline '{}'", args.in_path.display()))?;
    pipeline.validate()?;

    let tasks: Vec<String> = if args.tasks.is_empty() {
        pipeline.sinks().into_iter().map(str::to_string).collect()
    } else {
        args.tasks
    };
    if tasks.is_empty() {
        anyhow::bail!("pipeline '{}' has no tasks", args.in_path.display());
    }

    let mut observer = imagecat::TracingObserver;
    let mut evaluator = pipeline.evaluator();
    for task in &tasks {
        let output = evaluator
            .evaluate(task, &mut observer)
            .with_context(|| format!("evaluate task '{task}'"))?;
        println!("{task}: {output:?}");
    }
    Ok(())
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let image = imagecat::load_image(&args.in_path)?;
    println!("{}", args.in_path.display());
    for (name, layer) in image.layers() {
        let [rows, cols, channels] = layer.shape();
        println!(
            "  {name}: {cols}x{rows}x{channels} {:?} {:?} [{}]",
            layer.role(),
            layer.sample_type(),
            layer.flat_channel_names(name).join(", ")
        );
    }
    for (key, value) in image.metadata() {
        println!("  {key} = {value:?}");
    }
    Ok(())
}
