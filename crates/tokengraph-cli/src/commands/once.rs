use tokengraph_core::{serializer, write_artifact, GraphConfig};

use crate::cli::OnceArgs;
use crate::error::CliError;

pub async fn run(args: &OnceArgs, mut config: GraphConfig) -> Result<(), CliError> {
    args.overrides.apply(&mut config);
    if let Some(output) = &args.output {
        config.output_path = output.clone();
    }

    let report = super::pipeline(&config)?.run_cycle().await?;

    if args.stdout {
        println!("{}", serializer::to_pretty_string(&report.graph)?);
    } else {
        write_artifact(&config.output_path, &report.graph)?;
        println!("{}", serde_json::to_string_pretty(&report.summary())?);
    }
    Ok(())
}
