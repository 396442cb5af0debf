use std::fs;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::*;

fn page_size() -> u64 {
    unsafe { libc::sysconf(libc::_SC_PAGESIZE) as u64 }
}

/// Sparse file standing in for `/dev/mem`, with `div` stored at `base + BSC_DIV_OFFSET`.
fn fake_dev_mem(name: &str, base: u64, div: u32) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "bsc-clkdiv-{}-{}.img",
        name,
        std::process::id()
    ));
    let mut file = File::create(&path).unwrap();
    file.set_len(base + BSC_SIZE as u64).unwrap();
    file.seek(SeekFrom::Start(base + BSC_DIV_OFFSET as u64)).unwrap();
    file.write_all(&div.to_ne_bytes()).unwrap();
    path
}

fn config(device: &Path, base: u64) -> Config {
    Config {
        device: device.to_path_buf(),
        base,
        size: BSC_SIZE,
    }
}

fn div_in_file(path: &Path, base: u64) -> u32 {
    let bytes = fs::read(path).unwrap();
    let at = (base as usize) + BSC_DIV_OFFSET;
    u32::from_ne_bytes(bytes[at..at + 4].try_into().unwrap())
}

#[test]
fn default_config_targets_bsc1() {
    let config = Config::default();
    assert_eq!(config.device, PathBuf::from("/dev/mem"));
    assert_eq!(config.base, 0x2080_4000);
    assert_eq!(config.size, 0x20);
}

#[test]
fn reads_divider_through_mapping() {
    let base = page_size();
    let path = fake_dev_mem("read", base, 0x05DC);

    let window = RegisterWindow::map(&config(&path, base)).unwrap();
    assert_eq!(window.size(), BSC_SIZE);
    assert_eq!(window.read_div(), 0x05DC);
    assert_eq!(window.read(0), 0);
    window.unmap().unwrap();

    fs::remove_file(path).unwrap();
}

#[test]
fn writes_divider_through_mapping() {
    let base = 2 * page_size();
    let path = fake_dev_mem("write", base, 0x05DC);

    let mut window = RegisterWindow::map(&config(&path, base)).unwrap();
    window.write_div(0x61A8);
    assert_eq!(window.read_div(), 0x61A8);
    window.unmap().unwrap();

    assert_eq!(div_in_file(&path, base), 0x61A8);
    fs::remove_file(path).unwrap();
}

#[test]
fn drop_releases_mapping() {
    let base = page_size();
    let path = fake_dev_mem("drop", base, 0);

    {
        let mut window = RegisterWindow::map(&config(&path, base)).unwrap();
        window.write_div(1);
    }

    assert_eq!(div_in_file(&path, base), 1);
    fs::remove_file(path).unwrap();
}

#[test]
fn missing_device_is_open_error() {
    let device = PathBuf::from("/nonexistent/bsc-clkdiv/mem");
    let err = RegisterWindow::map(&config(&device, 0)).err().unwrap();

    assert_eq!(err.op, Op::Open);
    assert_eq!(err.source.kind(), io::ErrorKind::NotFound);
    assert!(err
        .to_string()
        .starts_with("open /nonexistent/bsc-clkdiv/mem: "));
}

#[test]
fn unaligned_base_is_mmap_error() {
    let path = fake_dev_mem("unaligned", page_size(), 0);
    let err = RegisterWindow::map(&config(&path, 1)).err().unwrap();

    assert_eq!(err.op, Op::Mmap);
    assert_eq!(err.source.raw_os_error(), Some(libc::EINVAL));
    assert!(err.to_string().starts_with("mmap: "));
    fs::remove_file(path).unwrap();
}

#[test]
#[should_panic(expected = "outside")]
fn offset_past_window_panics() {
    let base = page_size();
    let path = fake_dev_mem("past-end", base, 0);
    let window = RegisterWindow::map(&config(&path, base)).unwrap();
    fs::remove_file(&path).unwrap();
    window.read(BSC_SIZE);
}
