use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;

use osis_from_html::{convert_html, Profile, ProfileKind};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input HTML file exported from the word processor.
    #[arg(long)]
    html_file: PathBuf,

    /// Output OSIS XML path.
    #[arg(long)]
    out: PathBuf,

    /// Markup shape of the export.
    #[arg(long, value_enum, default_value_t)]
    profile: ProfileKind,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut html = String::new();
    File::open(&args.html_file)
        .with_context(|| format!("open {}", args.html_file.display()))?
        .read_to_string(&mut html)
        .context("read html")?;

    let profile = Profile::from(args.profile);
    let conversion = convert_html(&html, &profile)
        .with_context(|| format!("convert {}", args.html_file.display()))?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir {}", parent.display()))?;
    }
    let mut f = File::create(&args.out)
        .with_context(|| format!("create output {}", args.out.display()))?;
    f.write_all(conversion.xml.as_bytes())
        .context("write osis")?;

    info!(
        "wrote {} ({} books, {} verses)",
        args.out.display(),
        conversion.stats.books,
        conversion.stats.verses
    );
    Ok(())
}
