//! CLI command implementations
//!
//! One module per subcommand. Each takes its parsed options plus the loaded
//! [`Config`] and writes its output to stdout.

pub mod analyze;
pub mod schema;
pub mod show;
pub mod status;
pub mod upload;

pub use analyze::{run_analyze, AnalyzeOptions};
pub use schema::run_schema;
pub use show::{run_show, ShowOptions};
pub use status::run_status;
pub use upload::run_upload;

use crate::config::Config;
use crate::dashboard::{render_json, render_text, DashboardView};
use anyhow::Result;

fn emit_view(view: &DashboardView, json: bool, config: &Config) -> Result<()> {
    if json {
        println!("{}", render_json(view, config.output.json_pretty)?);
    } else {
        print!("{}", render_text(view));
    }
    Ok(())
}

fn emit_json<T: serde::Serialize>(value: &T, config: &Config) -> Result<()> {
    let json = if config.output.json_pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}
