use super::{RenderConfig, VERSION};
use clap::{value_t, App, Arg, ArgMatches};
use std::ffi::OsString;
use std::path::PathBuf;

fn cli_app<'a, 'b>() -> App<'a, 'b> {
    let arg_csvin = Arg::with_name("input_csvfile")
        .help("csv file with the metrics logged by the proxy")
        .required(true)
        .index(1);
    let arg_width = Arg::with_name("width")
        .help("width of the png, in pixels")
        .long("width")
        .takes_value(true)
        .default_value("1200");
    let arg_height = Arg::with_name("height")
        .help("height of the png, in pixels")
        .long("height")
        .takes_value(true)
        .default_value("2000");
    let arg_clamp = Arg::with_name("clamp_ssthresh")
        .help("draw the ssthresh values above this value at this value")
        .long_help(
            "an unset ssthresh is logged as 2147483647 and squeezes the congestion panel; \
            this only changes the drawing, not the data",
        )
        .long("clamp-ssthresh")
        .takes_value(true);
    App::new("proxy_metrics_plot")
        .version(VERSION.unwrap_or("unknown"))
        .author("Luca Peruzzo")
        .about("cli app to plot the TCP metrics of the client-proxy and proxy-server connections")
        .arg(arg_csvin)
        .arg(arg_width)
        .arg(arg_height)
        .arg(arg_clamp)
}

/// Takes the CLI arguments that control the plotting of the metrics.
/// Without the input file the usage goes to stdout and the process exits with 1,
/// other invalid arguments exit through clap.
pub fn parse_cli() -> (PathBuf, RenderConfig) {
    match parse_cli_from(std::env::args_os()) {
        Ok(parsed) => parsed,
        Err(e) if e.kind == clap::ErrorKind::MissingRequiredArgument => {
            println!("{}", e.message);
            std::process::exit(1);
        }
        Err(e) => e.exit(),
    }
}

/// Same as parse_cli on explicit arguments, the first one being the program name.
pub fn parse_cli_from<I, T>(args: I) -> Result<(PathBuf, RenderConfig), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli_args = cli_app().get_matches_from_safe(args)?;
    from_matches(&cli_args)
}

fn from_matches(cli_args: &ArgMatches) -> Result<(PathBuf, RenderConfig), clap::Error> {
    let csvin = PathBuf::from(cli_args.value_of_os("input_csvfile").unwrap_or_default());
    let width = value_t!(cli_args, "width", u32)?;
    let height = value_t!(cli_args, "height", u32)?;
    let ssthresh_clamp = if cli_args.is_present("clamp_ssthresh") {
        Some(value_t!(cli_args, "clamp_ssthresh", f64)?)
    } else {
        None
    };
    let config = RenderConfig {
        width,
        height,
        ssthresh_clamp,
    };
    Ok((csvin, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let (csvin, config) = parse_cli_from(vec!["proxy_metrics_plot", "logs/run1.csv"]).unwrap();
        assert_eq!(csvin, PathBuf::from("logs/run1.csv"));
        assert_eq!(config, RenderConfig::default());
    }

    #[test]
    fn options() {
        let (_, config) = parse_cli_from(vec![
            "proxy_metrics_plot",
            "run1.csv",
            "--width",
            "800",
            "--height",
            "1600",
            "--clamp-ssthresh",
            "500",
        ])
        .unwrap();
        assert_eq!(config.width, 800);
        assert_eq!(config.height, 1600);
        assert_eq!(config.ssthresh_clamp, Some(500.));
    }

    #[test]
    fn input_is_required() {
        let e = parse_cli_from(vec!["proxy_metrics_plot"]).unwrap_err();
        assert_eq!(e.kind, clap::ErrorKind::MissingRequiredArgument);
        assert!(e.message.contains("USAGE"), "{}", e.message);
        assert!(e.message.contains("<input_csvfile>"), "{}", e.message);
    }

    #[test]
    fn invalid_number() {
        let e = parse_cli_from(vec!["proxy_metrics_plot", "run1.csv", "--width", "wide"]).unwrap_err();
        assert_eq!(e.kind, clap::ErrorKind::ValueValidation);
    }
}
