mod command;
mod config;
mod log;
mod store;

use std::io;

use config::{Command, Config};
use store::Store;

fn main() -> anyhow::Result<()> {
	let config = Config::load()?;
	config.log.init()?;

	tracing::trace!(?config, "using config");

	// Enforced by clap, subcommand_required = true
	let Some(command) = config.command else {
		anyhow::bail!("no command given");
	};

	match command {
		Command::Decode { input, json } => {
			let column = command::read_input(input.as_deref())?;
			command::decode(&column, json, io::stdout().lock())?;
		}

		Command::Ingest {
			store,
			timestamp,
			format,
			pair,
			input,
		} => {
			let response = command::read_input(input.as_deref())?;

			let ingest = command::Ingest {
				timestamp,
				format,
				pairing: pair.then(|| config.pairing.config()),
			};

			let frame = ingest.run(&Store::new(store), &response)?;
			println!("{frame}");
		}

		Command::Verify { store } => {
			let frames = command::verify(&Store::new(store))?;

			match frames {
				Some(frames) => println!("ok: {} frames, {} observations", frames.len(), frames.observation_count()),
				None => println!("ok: empty"),
			}
		}
	}

	Ok(())
}
