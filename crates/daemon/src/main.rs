use clap::Parser;
use owo_colors::OwoColorize;

mod cli;

use cli::op::{Op, OpContext};
use cli::Cli;

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    let ctx = match OpContext::new(&args.remote, args.config_path.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    match args.command.execute(&ctx).await {
        Ok(output) => {
            let text = output.to_string();
            if !text.is_empty() {
                println!("{text}");
            }
        }
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}
