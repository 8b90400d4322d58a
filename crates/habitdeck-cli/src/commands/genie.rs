use crate::host::{print_events, runtime, CliResult, Host};

pub fn run() -> CliResult {
    let host = Host::open()?;
    let mut session = host.session();
    session.trigger_genie();
    runtime()?.block_on(session.settle())?;
    print_events(&session.drain_events());
    Ok(())
}
