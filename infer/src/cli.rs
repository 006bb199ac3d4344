use clap::{Parser, ValueEnum};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Emit {
    /// The document mapped through its inferred schema
    Object,
    /// The inferred schema itself
    Schema,
}

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    #[arg(help = "The source file or URL")]
    pub input: String,

    #[arg(long, help = "Allow a XML Document Type Definition (DTD) to occur")]
    pub allow_dtd: bool,

    #[arg(long, value_enum, default_value = "object", help = "What to print")]
    pub emit: Emit,

    #[arg(long, help = "Pretty-print the JSON output")]
    pub pretty: bool,

    #[arg(
        long,
        env = "DT_MAPPER_LOG",
        default_value = "warn",
        help = "Log filter, e.g. `debug` or `dt_mapper=trace`"
    )]
    pub log: String,
}
