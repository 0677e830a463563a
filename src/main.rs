use sheetbox::cli::commands::{CliArgs, Commands, ServeArgs};
use sheetbox::cli::handlers::{handle_run, handle_serve, handle_tools};
use sheetbox::util::init_logging;
use sheetbox::VERSION;

use clap::Parser;
use tracing::debug;

#[actix_web::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging(args.logging_config());

    debug!("sheetbox v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        None => handle_serve(&ServeArgs::default()).await,
        Some(Commands::Serve(serve_args)) => handle_serve(serve_args).await,
        Some(Commands::Tools(tools_args)) => handle_tools(tools_args),
        Some(Commands::Run(run_args)) => handle_run(run_args).await,
    };

    std::process::exit(exit_code);
}
