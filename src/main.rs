use std::process::ExitCode;

fn main() -> ExitCode {
    let _ = env_logger::Builder::from_default_env().try_init();

    match voxfit::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
