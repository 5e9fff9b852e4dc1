#![allow(non_snake_case, non_upper_case_globals)]

//! Reader for Intel HEX images.
//!
//! Covers I32HEX as described in [this wikipedia article](https://en.wikipedia.org/wiki/Intel_HEX):
//! data, end of file, both extended address records and the linear start address. Records are
//! kept in file order; resolving them to absolute addresses is up to the loader.

use regex::Regex;
use std::fmt::{self, Display};
use std::fs::File;
use std::io;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub mod HexRecordType {
    pub const Data: u8 = 0;
    pub const EndOfFile: u8 = 1;
    pub const ExSegAddr: u8 = 2;
    pub const StartSegAddr: u8 = 3;
    pub const ExLinAddr: u8 = 4;
    pub const StartLinAddr: u8 = 5;
}
pub struct HexRecord {
    pub data_size: u8,
    pub address: u16,
    pub record_type: u8,
    pub data: Option<Vec<u8>>,
    pub checksum: u8,
}
impl Display for HexRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dstr = String::new();
        if let Some(data) = &self.data {
            use fmt::Write;
            data.iter().for_each(|&b| _ = write!(dstr, "{:02X}", b));
        }
        write!(
            f,
            ":{:02X}{:04X}{:02X}{dstr}{:02X}",
            self.data_size, self.address, self.record_type, self.checksum
        )
    }
}
use super::Error;
impl HexRecord {
    /// Parse one line. Lines without a record return Ok(None); a malformed record or a bad
    /// checksum is an error.
    pub fn from_str<S: AsRef<str>>(s: S) -> Result<Option<Self>, Error> {
        let re = Regex::new(r"(?i)^.*:([0-9a-f]{2})([0-9a-f]{4})([0-9a-f]{2})((?:[0-9a-f]{2})*)([0-9a-f]{2})")
            .map_err(|e| general_err!(e))?;
        match re.captures(s.as_ref()) {
            Some(c) => Self::from_captures(&c)
                .map(Some)
                .ok_or_else(|| general_err!(format!("bad hex record \"{}\"", s.as_ref().trim()))),
            None => Ok(None),
        }
    }
    fn from_captures(c: &regex::Captures) -> Option<Self> {
        let data_size = u8::from_str_radix(c.get(1)?.as_str(), 16).ok()?;
        let h = HexRecord {
            data_size,
            address: u16::from_str_radix(c.get(2)?.as_str(), 16).ok()?,
            record_type: u8::from_str_radix(c.get(3)?.as_str(), 16).ok()?,
            data: HexRecord::data_from_str(c.get(4)?.as_str(), data_size),
            checksum: u8::from_str_radix(c.get(5)?.as_str(), 16).ok()?,
        };
        h.calc_checksum().filter(|&c| c == h.checksum).map(|_| h)
    }
    fn data_from_str(s: &str, byte_count: u8) -> Option<Vec<u8>> {
        if byte_count == 0 || s.len() < (2 * byte_count) as usize {
            return None;
        }
        (0..byte_count as usize)
            .map(|i| u8::from_str_radix(&s[i * 2..(i + 1) * 2], 16).ok())
            .collect()
    }
    fn calc_checksum(&self) -> Option<u8> {
        let mut sum = 0u16;
        sum += self.data_size as u16;
        sum += self.address >> 8;
        sum += self.address & 0xff;
        sum += self.record_type as u16;
        if let Some(data) = self.data.as_ref() {
            data.iter().for_each(|&b| sum += b as u16);
            if data.len() != self.data_size as usize {
                return None;
            }
        }
        Some((sum as u8).wrapping_neg())
    }
    /// The data field read as one big-endian number (address records carry 2 or 4 bytes).
    pub fn value(&self) -> Option<u32> {
        let data = self.data.as_ref().filter(|d| d.len() <= 4)?;
        Some(data.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32))
    }
}

pub struct HexRecordCollection {
    records: Vec<HexRecord>,
    eof: bool,
}

impl HexRecordCollection {
    pub fn from_str_iter<I, T>(iter: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut hf = HexRecordCollection {
            records: Vec::new(),
            eof: false,
        };
        for s in iter {
            if let Some(hr) = HexRecord::from_str(s.into())? {
                hf.add_record(hr)?
            }
        }
        if hf.eof {
            Ok(hf)
        } else {
            Err(general_err!("EOF record not found in hex file"))
        }
    }
    pub fn add_record(&mut self, h: HexRecord) -> Result<(), Error> {
        if self.eof {
            return Err(general_err!("records after EOF in hex file"));
        }
        if h.record_type == HexRecordType::EndOfFile {
            self.eof = true
        }
        self.records.push(h);
        Ok(())
    }
    pub fn read_from_file(path: &Path) -> Result<Self, Error> {
        let file = BufReader::new(File::open(path)?)
            .lines()
            .collect::<Result<Vec<String>, io::Error>>()?;
        HexRecordCollection::from_str_iter(file)
    }
}

use std::ops::Deref;
impl Deref for HexRecordCollection {
    type Target = Vec<HexRecord>;
    fn deref(&self) -> &Self::Target { &self.records }
}
