//! Physical memory register window
//!
//! Maps a small block of physical address space from `/dev/mem` (or any file
//! that can be mapped the same way) and exposes its 32-bit registers.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::{AsRawFd, IntoRawFd};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use crate::bsc::{BSC1_BASE, BSC_DIV_OFFSET, BSC_SIZE};

/// Default physical memory device.
pub const DEV_MEM: &str = "/dev/mem";

/// Register window configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Device or file providing the physical address space.
    pub device: PathBuf,
    /// Physical base address of the window. Must be page aligned.
    pub base: u64,
    /// Window size in bytes.
    pub size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: PathBuf::from(DEV_MEM),
            base: BSC1_BASE,
            size: BSC_SIZE,
        }
    }
}

/// Which step of acquiring or releasing the window failed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Op {
    Open,
    Mmap,
    Close,
}

/// OS error raised while acquiring or releasing a window.
#[derive(Debug)]
pub struct OsError {
    pub op: Op,
    pub device: PathBuf,
    pub source: io::Error,
}

impl std::fmt::Display for OsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.op {
            Op::Open => write!(f, "open {}: {}", self.device.display(), self.source),
            Op::Mmap => write!(f, "mmap: {}", self.source),
            Op::Close => write!(f, "close: {}", self.source),
        }
    }
}

impl std::error::Error for OsError {}

/// Access to the BSC clock divider register.
pub trait DivRegister {
    /// Read the raw DIV register.
    fn read_div(&self) -> u32;
    /// Write the raw DIV register.
    fn write_div(&mut self, value: u32);
}

/// A mapped block of 32-bit registers.
///
/// The mapping is released when the window is dropped. Use [`RegisterWindow::unmap`]
/// to observe the `munmap` result instead.
pub struct RegisterWindow {
    ptr: NonNull<u32>,
    size: usize,
}

impl RegisterWindow {
    /// Open the device, map the window and close the device again.
    pub fn map(config: &Config) -> Result<Self, OsError> {
        let err = |op, source| OsError {
            op,
            device: config.device.clone(),
            source,
        };

        let file = open_device(&config.device).map_err(|e| err(Op::Open, e))?;
        debug!("opened {}", config.device.display());

        let window = map_window(&file, config.base, config.size).map_err(|e| err(Op::Mmap, e))?;
        debug!(
            "mapped {:#010x}..{:#010x} at {:p}",
            config.base,
            config.base + config.size as u64,
            window.ptr
        );

        // The mapping stays valid after the descriptor is closed. If close
        // fails, `window` is dropped on the way out and unmaps itself.
        close_device(file).map_err(|e| err(Op::Close, e))?;

        Ok(window)
    }

    /// Size of the window in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Volatile read of the register at `offset` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is unaligned or outside the window.
    pub fn read(&self, offset: usize) -> u32 {
        let reg = self.reg(offset);
        let value = unsafe { reg.read_volatile() };
        trace!("read  [{:#04x}] = {:#010x}", offset, value);
        value
    }

    /// Volatile write of the register at `offset` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is unaligned or outside the window.
    pub fn write(&mut self, offset: usize, value: u32) {
        let reg = self.reg(offset);
        trace!("write [{:#04x}] = {:#010x}", offset, value);
        unsafe { reg.write_volatile(value) }
    }

    /// Unmap the window.
    pub fn unmap(self) -> io::Result<()> {
        let this = std::mem::ManuallyDrop::new(self);
        unsafe { munmap(this.ptr, this.size) }
    }

    fn reg(&self, offset: usize) -> *mut u32 {
        assert!(
            offset % 4 == 0 && offset + 4 <= self.size,
            "register offset {:#x} outside {:#x} byte window",
            offset,
            self.size
        );
        unsafe { self.ptr.as_ptr().add(offset / 4) }
    }
}

impl DivRegister for RegisterWindow {
    fn read_div(&self) -> u32 {
        self.read(BSC_DIV_OFFSET)
    }

    fn write_div(&mut self, value: u32) {
        self.write(BSC_DIV_OFFSET, value)
    }
}

impl Drop for RegisterWindow {
    fn drop(&mut self) {
        if let Err(e) = unsafe { munmap(self.ptr, self.size) } {
            error!("munmap: {}", e);
        }
    }
}

fn open_device(path: &Path) -> io::Result<File> {
    OpenOptions::new().read(true).write(true).open(path)
}

fn map_window(file: &File, base: u64, size: usize) -> io::Result<RegisterWindow> {
    let offset = libc::off_t::try_from(base)
        .map_err(|_| io::Error::from_raw_os_error(libc::EOVERFLOW))?;

    let ptr = unsafe {
        libc::mmap(
            core::ptr::null_mut(),
            size,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_SHARED,
            file.as_raw_fd(),
            offset,
        )
    };
    if ptr == libc::MAP_FAILED {
        return Err(io::Error::last_os_error());
    }

    let ptr = NonNull::new(ptr.cast::<u32>())
        .ok_or_else(|| io::Error::from_raw_os_error(libc::EFAULT))?;
    Ok(RegisterWindow { ptr, size })
}

fn close_device(file: File) -> io::Result<()> {
    let fd = file.into_raw_fd();
    if unsafe { libc::close(fd) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Safety: `ptr`/`size` must describe a live mapping created by `map_window`.
unsafe fn munmap(ptr: NonNull<u32>, size: usize) -> io::Result<()> {
    if unsafe { libc::munmap(ptr.as_ptr().cast(), size) } < 0 {
        return Err(io::Error::last_os_error());
    }
    debug!("unmapped {} bytes at {:p}", size, ptr);
    Ok(())
}

#[cfg(test)]
mod tests;
