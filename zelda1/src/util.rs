use std::io;
use std::io::{Cursor, Read};

use failure::{format_err, Error};

/// Bounds-checked reader over a borrowed ROM image.
pub struct RomReader<'a> {
    cursor: Cursor<&'a [u8]>,
    base_offset: usize,
}

impl<'a> RomReader<'a> {
    pub fn new(data: &'a [u8], base_offset: usize) -> Result<RomReader<'a>, Error> {
        if base_offset > data.len() {
            return Err(format_err!(
                "read at {:#x} is beyond the end of the image ({:#x} bytes)",
                base_offset,
                data.len()
            ));
        }
        Ok(RomReader {
            cursor: Cursor::new(&data[base_offset..]),
            base_offset,
        })
    }

    pub fn cur_address(&self) -> usize {
        self.base_offset + self.cursor.position() as usize
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, Error> {
        let mut data = vec![0; len];
        self.cursor
            .read_exact(&mut data)
            .map_err(|_| format_err!("short read of {} bytes at {:#x}", len, self.cur_address()))?;
        Ok(data)
    }
}

impl<'a> Read for RomReader<'a> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}
