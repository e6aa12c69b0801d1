use clap::{App, Arg, ArgMatches};

pub fn parse_command_line<'a>() -> ArgMatches<'a> {
    App::new("geogrid")
        .version(crate_version!())
        .author("Geogrid Authors")
        .about(
            "Counts geotagged posts and their top hashtags per grid cell",
        )
        .arg(
            Arg::with_name("tweets")
                .long("tweets")
                .short("t")
                .help("File of tweets, one JSON record per line")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("grid")
                .long("grid")
                .short("g")
                .help("GeoJSON file of grid cells")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("workers")
                .long("workers")
                .short("w")
                .help("Number of workers, defaults to the available parallelism")
                .takes_value(true)
                .required(false),
        )
        .arg(
            Arg::with_name("top")
                .long("top")
                .short("k")
                .help("Hashtags reported per cell, ties at the cut-off included")
                .takes_value(true)
                .default_value("5")
                .required(false),
        )
        .arg(
            Arg::with_name("hashtag-source")
                .long("hashtag-source")
                .help("Where hashtags are read from")
                .takes_value(true)
                .possible_values(&["entities", "text"])
                .default_value("entities")
                .required(false),
        )
        .arg(
            Arg::with_name("json")
                .long("json")
                .help("Prints the report as JSON")
                .takes_value(false)
                .required(false),
        )
        .get_matches()
}
