use log::{debug, info, trace};
use nix::sys::socket::{socket, AddressFamily, SockFlag, SockType};
use std::io;
use std::os::fd::{AsRawFd, OwnedFd};

use super::{validate_interface_name, StatsSource};
use crate::collectors::queues::errors::{QueueError, QueueResult};

// From <linux/ethtool.h>
const ETHTOOL_GDRVINFO: u32 = 0x0000_0003;
const ETHTOOL_GSTRINGS: u32 = 0x0000_001b;
const ETHTOOL_GSTATS: u32 = 0x0000_001d;
const ETH_SS_STATS: u32 = 1;
const ETH_GSTRING_LEN: usize = 32;

// Filled in by the kernel; only some fields are read
#[allow(dead_code)]
#[repr(C)]
struct EthtoolDrvinfo {
    cmd: u32,
    driver: [u8; 32],
    version: [u8; 32],
    fw_version: [u8; 32],
    bus_info: [u8; 32],
    erom_version: [u8; 32],
    reserved2: [u8; 12],
    n_priv_flags: u32,
    n_stats: u32,
    testinfo_len: u32,
    eedump_len: u32,
    regdump_len: u32,
}

/// `struct ifreq` with the `ifr_data` union member; the padding covers the
/// largest union member on 64-bit targets
#[repr(C)]
struct IfReq {
    ifr_name: [libc::c_char; libc::IFNAMSIZ],
    ifr_data: *mut libc::c_void,
    _pad: [u8; 16],
}

/// ethtool statistics for one interface
pub struct EthtoolSource {
    interface: String,
    socket: OwnedFd,
}

impl EthtoolSource {
    pub fn open(interface: &str) -> QueueResult<Self> {
        validate_interface_name(interface)?;

        let socket = socket(
            AddressFamily::Inet,
            SockType::Datagram,
            SockFlag::SOCK_CLOEXEC,
            None,
        )
        .map_err(|errno| QueueError::Ioctl {
            interface: interface.to_string(),
            operation: "socket",
            source: io::Error::from(errno),
        })?;

        let source = Self {
            interface: interface.to_string(),
            socket,
        };

        // Fail early on a missing interface rather than on the first read
        let info = source.driver_info()?;
        info!(
            "Opened ethtool statistics for '{}' (driver={}, version={}, firmware={}, bus={}, n_stats={})",
            interface,
            c_string(&info.driver),
            c_string(&info.version),
            c_string(&info.fw_version),
            c_string(&info.bus_info),
            info.n_stats
        );

        Ok(source)
    }

    fn driver_info(&self) -> QueueResult<EthtoolDrvinfo> {
        // SAFETY: EthtoolDrvinfo is plain integers and byte arrays
        let mut info: EthtoolDrvinfo = unsafe { std::mem::zeroed() };
        info.cmd = ETHTOOL_GDRVINFO;
        self.ethtool(
            "ETHTOOL_GDRVINFO",
            (&mut info as *mut EthtoolDrvinfo).cast(),
        )?;
        Ok(info)
    }

    fn stat_count(&self) -> QueueResult<usize> {
        Ok(self.driver_info()?.n_stats as usize)
    }

    /// Issues one SIOCETHTOOL request with `data` as the command buffer
    fn ethtool(&self, operation: &'static str, data: *mut libc::c_void) -> QueueResult<()> {
        let mut request = IfReq {
            ifr_name: [0; libc::IFNAMSIZ],
            ifr_data: data,
            _pad: [0; 16],
        };
        for (dst, src) in request.ifr_name.iter_mut().zip(self.interface.bytes()) {
            *dst = src as libc::c_char;
        }

        trace!("ioctl SIOCETHTOOL {} on '{}'", operation, self.interface);

        // SAFETY: `request` outlives the call and `data` points at a buffer
        // sized for `operation` by the caller
        let ret = unsafe {
            libc::ioctl(
                self.socket.as_raw_fd(),
                libc::SIOCETHTOOL as _,
                &mut request as *mut IfReq,
            )
        };

        if ret < 0 {
            return Err(self.map_os_error(operation, io::Error::last_os_error()));
        }
        Ok(())
    }

    fn map_os_error(&self, operation: &'static str, error: io::Error) -> QueueError {
        match error.raw_os_error() {
            Some(libc::ENODEV) => QueueError::InterfaceNotFound {
                interface: self.interface.clone(),
            },
            Some(libc::EPERM) | Some(libc::EACCES) => QueueError::PermissionDenied {
                interface: self.interface.clone(),
            },
            _ => QueueError::Ioctl {
                interface: self.interface.clone(),
                operation,
                source: error,
            },
        }
    }
}

impl StatsSource for EthtoolSource {
    fn interface(&self) -> &str {
        &self.interface
    }

    fn driver_name(&mut self) -> QueueResult<String> {
        Ok(c_string(&self.driver_info()?.driver))
    }

    fn counter_names(&mut self) -> QueueResult<Vec<String>> {
        let count = self.stat_count()?;

        // struct ethtool_gstrings: cmd, string_set, len, then len * ETH_GSTRING_LEN bytes
        let header = 3 * std::mem::size_of::<u32>();
        let mut buffer = vec![0u8; header + count * ETH_GSTRING_LEN];
        buffer[0..4].copy_from_slice(&ETHTOOL_GSTRINGS.to_ne_bytes());
        buffer[4..8].copy_from_slice(&ETH_SS_STATS.to_ne_bytes());
        buffer[8..12].copy_from_slice(&(count as u32).to_ne_bytes());

        self.ethtool("ETHTOOL_GSTRINGS", buffer.as_mut_ptr().cast())?;

        let names: Vec<String> = buffer[header..]
            .chunks_exact(ETH_GSTRING_LEN)
            .map(c_string)
            .collect();

        debug!("Read {} statistic names from '{}'", names.len(), self.interface);
        Ok(names)
    }

    fn read_counters(&mut self) -> QueueResult<Vec<u64>> {
        // The kernel writes as many values as the driver currently reports, so
        // the buffer is sized from a fresh count on every read
        let count = self.stat_count()?;

        // struct ethtool_stats: cmd, n_stats, then n_stats u64 values
        let mut header = [0u8; 8];
        header[0..4].copy_from_slice(&ETHTOOL_GSTATS.to_ne_bytes());
        header[4..8].copy_from_slice(&(count as u32).to_ne_bytes());

        let mut buffer = vec![0u64; 1 + count];
        buffer[0] = u64::from_ne_bytes(header);

        self.ethtool("ETHTOOL_GSTATS", buffer.as_mut_ptr().cast())?;

        buffer.remove(0);
        Ok(buffer)
    }
}

/// Reads a NUL-terminated fixed-size kernel string
fn c_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
