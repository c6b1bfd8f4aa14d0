// In src/main.rs

//! `xfont-match`: resolve a font request the way the toolkit does and print
//! what was loaded, or browse the font catalog.

use xfont_match::{
    config::MatchConfig,
    fonts::{
        database::PointSizes,
        encoding::Script,
        request::{parse_weight_arg, CharSet, FontRequest, StyleHint},
        FontDriver, FontManager, HeadlessFontDriver,
    },
};

use anyhow::{bail, Context, Result};
use log::{error, info};
use serde::Serialize;
use std::path::PathBuf;

const USAGE: &str = "\
usage: xfont-match [options]

font source:
  --names-file PATH   match against the font names listed in PATH
                      (one per line) instead of an X server
  --config PATH       JSON configuration file

request:
  --family NAME       family name (empty: use the style hint's default)
  --size POINTS       point size (default 12)
  --weight W          0..99 or light|normal|demibold|bold|black
  --italic            ask for an italic or oblique face
  --fixed             ask for a fixed-pitch face
  --charset CS        e.g. iso8859-1, iso10646-1, koi8-r, ja, zh
  --hint HINT         any|sans|serif|typewriter|decorative|system
  --raw NAME          open NAME literally

catalog:
  --families          list font families
  --styles FAMILY     list the styles of FAMILY
  --sizes FAMILY      list the sizes of FAMILY in --style (default Normal)
  --style STYLE       style used by --sizes
  --script SCRIPT     only load families covering SCRIPT (e.g. cyrillic)

  --json              print JSON instead of text
  -h, --help          print this help";

/// What the command line asks for.
#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    names_file: Option<PathBuf>,
    request: FontRequest,
    families: bool,
    styles: Option<String>,
    sizes: Option<String>,
    style: Option<String>,
    script: Option<Script>,
    json: bool,
}

impl Args {
    fn parse<I: Iterator<Item = String>>(mut argv: I) -> Result<Option<Self>> {
        let mut args = Args::default();
        while let Some(arg) = argv.next() {
            let mut value = |flag: &str| {
                argv.next()
                    .with_context(|| format!("{} needs a value", flag))
            };
            match arg.as_str() {
                "-h" | "--help" => return Ok(None),
                "--config" => args.config = Some(PathBuf::from(value(&arg)?)),
                "--names-file" => args.names_file = Some(PathBuf::from(value(&arg)?)),
                "--family" => args.request.family = value(&arg)?,
                "--size" => {
                    let size = value(&arg)?;
                    let points: u32 = size
                        .parse()
                        .with_context(|| format!("invalid point size '{}'", size))?;
                    args.request.deci_point_size = points.saturating_mul(10);
                }
                "--weight" => args.request.weight = parse_weight_arg(&value(&arg)?)?,
                "--italic" => args.request.italic = true,
                "--fixed" => args.request.fixed_pitch = true,
                "--charset" => args.request.charset = value(&arg)?.parse::<CharSet>()?,
                "--hint" => args.request.style_hint = value(&arg)?.parse::<StyleHint>()?,
                "--raw" => {
                    args.request.family = value(&arg)?;
                    args.request.raw_mode = true;
                }
                "--families" => args.families = true,
                "--styles" => args.styles = Some(value(&arg)?),
                "--sizes" => args.sizes = Some(value(&arg)?),
                "--style" => args.style = Some(value(&arg)?),
                "--script" => args.script = Some(value(&arg)?.parse::<Script>()?),
                "--json" => args.json = true,
                other => bail!("unknown argument '{}'\n\n{}", other, USAGE),
            }
        }
        Ok(Some(args))
    }

    fn browses_catalog(&self) -> bool {
        self.families || self.styles.is_some() || self.sizes.is_some()
    }
}

#[derive(Serialize)]
struct LoadReport<'a> {
    request: &'a FontRequest,
    resolution: &'a xfont_match::fonts::resolver::Resolution,
    font: &'a str,
    info: &'a xfont_match::fonts::font_info::FontInfo,
    metrics: xfont_match::fonts::FontMetrics,
    line_metrics: xfont_match::fonts::font_info::LineMetrics,
}

fn print_load<D: FontDriver>(manager: &mut FontManager<D>, args: &Args) -> Result<()> {
    let loaded = manager
        .load(&args.request)
        .with_context(|| format!("Failed to load font for {}", args.request))?;
    let report = LoadReport {
        request: &args.request,
        resolution: &loaded.resolution,
        font: &loaded.entry.name,
        info: &loaded.info,
        metrics: loaded.entry.metrics(),
        line_metrics: loaded.entry.line_metrics(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("name: {}", report.resolution.name);
    if report.font != report.resolution.name {
        println!("opened: {}", report.font);
    }
    println!("kind: {:?}", report.resolution.kind);
    println!("exact: {}", if loaded.exact_match() { "yes" } else { "no" });
    println!(
        "family: {} {}pt weight {}{}{}",
        report.info.family,
        report.info.point_size(),
        report.info.weight,
        if report.info.italic { " italic" } else { "" },
        if report.info.fixed_pitch { " fixed" } else { "" },
    );
    println!(
        "metrics: ascent {} descent {} max width {}",
        report.metrics.ascent, report.metrics.descent, report.metrics.max_width
    );
    Ok(())
}

fn print_catalog<D: FontDriver>(manager: &mut FontManager<D>, args: &Args) -> Result<()> {
    let family = args.styles.as_deref().or(args.sizes.as_deref());
    let database = manager.database(family, args.script);

    if args.families {
        let families = database.families();
        if args.json {
            println!("{}", serde_json::to_string_pretty(&families)?);
        } else {
            families.iter().for_each(|f| println!("{}", f));
        }
    }
    if let Some(family) = &args.styles {
        let styles = database.styles(family);
        if styles.is_empty() {
            bail!("no family named '{}'", family);
        }
        if args.json {
            println!("{}", serde_json::to_string_pretty(&styles)?);
        } else {
            styles.iter().for_each(|s| println!("{}", s));
        }
    }
    if let Some(family) = &args.sizes {
        let style = args.style.as_deref().unwrap_or("Normal");
        let sizes = database.point_sizes(family, style);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&sizes)?);
        } else {
            match sizes {
                PointSizes::Scalable => println!("scalable"),
                PointSizes::Sizes(sizes) => sizes.iter().for_each(|s| println!("{}", s)),
            }
        }
    }
    Ok(())
}

fn run<D: FontDriver>(driver: D, config: MatchConfig, args: &Args) -> Result<()> {
    let mut manager = FontManager::new(driver, config);
    manager.init();
    let result = if args.browses_catalog() {
        print_catalog(&mut manager, args)
    } else {
        print_load(&mut manager, args)
    };
    manager.log_cache_statistics();
    manager.teardown();
    result
}

#[cfg(feature = "x11")]
fn run_on_server(config: MatchConfig, args: &Args) -> Result<()> {
    let driver = xfont_match::fonts::x11_font_driver::X11FontDriver::open()
        .context("Failed to connect the font driver to the X server")?;
    run(driver, config, args)
}

#[cfg(not(feature = "x11"))]
fn run_on_server(_config: MatchConfig, _args: &Args) -> Result<()> {
    bail!("built without X11 support; pass --names-file to match against a font list")
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let Some(args) = Args::parse(std::env::args().skip(1))? else {
        println!("{}", USAGE);
        return Ok(());
    };
    let config = MatchConfig::load_or_default(args.config.as_deref());

    let result = match &args.names_file {
        Some(path) => {
            info!("Matching against font names from '{}'", path.display());
            let driver = HeadlessFontDriver::from_names_file(path)?;
            run(driver, config, &args)
        }
        None => run_on_server(config, &args),
    };
    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}
