use wallchd::DaemonError;

fn main() -> Result<(), DaemonError> {
    wallchd::daemon::start().inspect_err(|err| eprintln!("{err}"))
}
