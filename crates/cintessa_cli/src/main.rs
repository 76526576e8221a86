use std::io::{self, BufRead, Write};

use cintessa::logging::init_logging;
use cintessa::{Agent, AgentOptions, EnvConfig};
use cintessa_cli::app::{App, BANNER};
use cintessa_cli::providers;
use tracing::info;

fn main() -> io::Result<()> {
    let config = EnvConfig::from_env();
    init_logging(config.log_filter.as_deref());

    let provider = providers::provider_from_env().map_err(io::Error::other)?;
    let profile = provider.profile();
    info!(
        provider = %profile.provider_id,
        model = %profile.model_id,
        "starting cintessa"
    );

    let agent = Agent::with_options(provider, AgentOptions::from(&config))
        .map_err(io::Error::other)?;
    let mut app = App::new(agent);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    writeln!(stdout, "{BANNER}")?;

    let mut lines = stdin.lock().lines();
    while !app.should_exit {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let Some(line) = lines.next().transpose()? else {
            break;
        };
        if let Some(reply) = app.on_submit(&line) {
            writeln!(stdout, "{reply}\n")?;
        }
    }

    Ok(())
}
