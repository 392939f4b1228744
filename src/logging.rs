//! Logging setup. The engine itself only ever calls the `log` facade
//! macros; this module wires a concrete backend for the CLI binary.

use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Config as Log4rsConfig;

pub fn init(debug: bool) -> anyhow::Result<()> {
  let level = if debug { LevelFilter::Debug } else { LevelFilter::Info };

  let stdout = ConsoleAppender::builder()
    .encoder(Box::new(PatternEncoder::new(
      "{d(%Y-%m-%d %H:%M:%S)} {l} [{T}] {m}{n}",
    )))
    .build();

  let config = Log4rsConfig::builder()
    .appender(Appender::builder().build("stdout", Box::new(stdout)))
    .build(Root::builder().appender("stdout").build(level))?;

  log4rs::init_config(config)?;
  Ok(())
}
