#![allow(unused_macros)]
macro_rules! verbose_println {
    ($($p:expr),+) => {
        if (crate::config::ARGS.verbose) {
            println!($($p),+);
        }
    }
}
// Adding explicit carriage returns to some of these because the line editor can leave the
// terminal in a state where a bare LF doesn't return the cursor to the first column.
macro_rules! info {
    ($($p:expr),+) => {
        println!(concat!(blue!("INFO"),": {}\r"),format_args!($($p),+))
    }
}

macro_rules! warn {
    ($($p:expr),+) => {
        println!(concat!(red!("WARNING"),": {}\r"),format_args!($($p),+))
    }
}
macro_rules! general_err {
    ($msg:expr) => {
        Error::new(crate::ErrorKind::General, format!("{}", $msg).as_str())
    };
}

macro_rules! syntax_err {
    ($msg:expr) => {
        Error::new(
            crate::ErrorKind::Syntax,
            format!("{} {}", red!("Syntax Error"), $msg).as_str(),
        )
    };
}
macro_rules! eval_err {
    ($($msg:expr),*) => {
        Error::new(
            crate::ErrorKind::Evaluation,
            format!("{} {}", red!("Evaluation Error"), format!($($msg),*)).as_str(),
        )
    };
}
/// true if bit $b of $a is set
macro_rules! bit {
    ($a: expr, $b: expr) => {
        (((($a) as u32) & (1 << ($b) as u32)) != 0)
    };
}
/// extracts $len bits of $a starting at bit $lsb
macro_rules! bits {
    ($a: expr, $lsb: expr, $len: expr) => {
        (((($a) as u32) >> ($lsb)) & ((1u32 << ($len)) - 1))
    };
}
macro_rules! color {
    ($color: literal, $msg: expr) => {
        concat!("\x1b[", $color, "m", $msg, "\x1b[0m")
    };
}
macro_rules! red {
    ($msg:expr) => {
        color!(91, $msg)
    };
}
macro_rules! blue {
    ($msg:expr) => {
        color!(94, $msg)
    };
}
