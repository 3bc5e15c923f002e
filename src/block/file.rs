//! 基于磁盘镜像文件的块设备（需要 `std` 特性）

use super::BlockDevice;
use crate::consts::SECTOR_SIZE;
use crate::error::{Error, ErrorKind, Result};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// 磁盘镜像文件
pub struct FileDisk {
    file: File,
    sectors: u64,
}

impl FileDisk {
    /// 以读写方式打开镜像文件
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|_| Error::new(ErrorKind::Io, "cannot open disk image"))?;
        let len = file
            .metadata()
            .map_err(|_| Error::new(ErrorKind::Io, "cannot stat disk image"))?
            .len();
        Ok(Self {
            file,
            sectors: len / SECTOR_SIZE as u64,
        })
    }

    fn seek_to(&mut self, first: u64, count: u32, buf_len: usize) -> Result<usize> {
        let len = count as usize * SECTOR_SIZE;
        if buf_len < len {
            return Err(Error::new(ErrorKind::InvalidInput, "buffer too small for sectors"));
        }
        if first + count as u64 > self.sectors {
            return Err(Error::new(ErrorKind::Io, "sector beyond end of device"));
        }
        self.file
            .seek(SeekFrom::Start(first * SECTOR_SIZE as u64))
            .map_err(|_| Error::new(ErrorKind::Io, "seek failed"))?;
        Ok(len)
    }
}

impl BlockDevice for FileDisk {
    fn sector_size(&self) -> u32 {
        SECTOR_SIZE as u32
    }

    fn total_sectors(&self) -> u64 {
        self.sectors
    }

    fn read_sectors(&mut self, first: u64, buf: &mut [u8], count: u32) -> Result<usize> {
        let len = self.seek_to(first, count, buf.len())?;
        self.file
            .read_exact(&mut buf[..len])
            .map_err(|_| Error::new(ErrorKind::Io, "short read from disk image"))?;
        Ok(len)
    }

    fn write_sectors(&mut self, first: u64, buf: &[u8], count: u32) -> Result<usize> {
        let len = self.seek_to(first, count, buf.len())?;
        self.file
            .write_all(&buf[..len])
            .map_err(|_| Error::new(ErrorKind::Io, "short write to disk image"))?;
        Ok(len)
    }

    fn flush(&mut self) -> Result<()> {
        self.file
            .sync_data()
            .map_err(|_| Error::new(ErrorKind::Io, "fsync failed"))
    }
}
