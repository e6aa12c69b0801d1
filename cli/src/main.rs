#[macro_use]
extern crate clap;
#[macro_use]
extern crate error_chain;
extern crate geogrid;
#[macro_use]
extern crate log;
extern crate serde_json;
extern crate util;

use errors::*;

mod errors {
    error_chain!{
        foreign_links {
            Io(::std::io::Error);
            Json(::serde_json::Error);
        }
    }
}

mod parser;
mod runner;

fn main() {
    if let Err(err) = util::init_logger() {
        eprintln!("Error: {}", err);
        ::std::process::exit(1);
    }

    let matches = parser::parse_command_line();

    if let Err(ref e) = run(&matches) {
        util::output_error(e);
        ::std::process::exit(1);
    }
}

fn run(matches: &clap::ArgMatches) -> Result<()> {
    let config = runner::RunConfig::from_matches(matches).chain_err(
        || "Invalid arguments",
    )?;
    runner::run(&config)
}
