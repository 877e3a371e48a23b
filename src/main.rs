// corefortd: a thin stdin/stdout front end for the corefort engine.

use corefort::config::Config;

fn main() {
    let mut config = Config::new();
    config.process_args();
    config.run_forth();
}
