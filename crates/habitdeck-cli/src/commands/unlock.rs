use crate::host::{print_events, runtime, CliResult, Host};

pub fn run(skip_ad: bool) -> CliResult {
    let host = Host::open()?;
    let mut session = host.session();

    if skip_ad {
        session.skip_ad()?;
    } else {
        session.begin_unlock();
    }
    // Ad end and overlay fade are scheduled; wait them out.
    runtime()?.block_on(session.settle())?;

    print_events(&session.drain_events());
    Ok(())
}
