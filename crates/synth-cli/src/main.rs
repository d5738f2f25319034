use std::process::ExitCode;
use synth_cli::{cli, init_tracing, run};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    let mut stdout = std::io::stdout().lock();
    let code = run(&matches, &mut stdout).await?;
    Ok(ExitCode::from(code))
}
