use clap::Parser;
use clap_num::maybe_hex;
use lazy_static::lazy_static;

#[derive(Parser, Debug)]
#[command(author,version,about,long_about=None)]
pub struct Args {
    /// Image to load: Intel hex (.hex) or raw binary (any other extension)
    pub file: Option<String>,

    /// Address at which to load a raw binary image (hex ok with '0x')
    #[arg(long,value_parser=maybe_hex::<u32>, default_value_t=0_u32)]
    pub load_addr: u32,

    /// Initial program counter target (defaults to the image start address or load address)
    #[arg(long,value_parser=maybe_hex::<u32>)]
    pub entry: Option<u32>,

    /// Size of emulated RAM in bytes, mapped at address 0
    #[arg(long,value_parser=maybe_hex::<u32>, default_value_t=0x0010_0000_u32)]
    pub ram_size: u32,

    /// Start executing in Thumb mode rather than ARM mode
    #[arg(short, long)]
    pub thumb: bool,

    /// Set a breakpoint before attaching (may be repeated)
    #[arg(short, long,value_parser=maybe_hex::<u32>)]
    pub breakpoint: Vec<u32>,

    /// Start running immediately instead of paused (press <ctrl-c> to break in)
    #[arg(short, long)]
    pub run: bool,

    /// The number of commands to keep in the console history
    #[arg(long, default_value_t = 200)]
    pub history: usize,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

lazy_static! {
    pub static ref ARGS: Args = if cfg!(test) {
        // manually set parameters for running tests
        Args::parse_from(["test"])
    } else {
        Args::parse()
    };
}

pub fn init() { lazy_static::initialize(&ARGS); }
pub fn history_size() -> usize { ARGS.history.max(1) }
