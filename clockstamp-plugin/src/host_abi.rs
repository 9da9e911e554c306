//! Capture host plugin ABI
//!
//! Manual definitions of the structures and constants the capture host
//! exchanges with its plugins. The host owns every struct passed in; the
//! plugin only reads and fills them.

#![allow(dead_code)]

use libc::{c_char, c_int, c_uint, c_void};

/// Oldest framework revision this plugin can talk to
pub const FRAMEWORK_VERSION: u32 = 1;
/// Name the host must announce (compared case-insensitively)
pub const FRAMEWORK_NAME: &str = "PluginFramework";

pub const TRUE: c_int = 1;
pub const FALSE: c_int = 0;

// Capability flags
pub const PLUGIN_FLAG_PICREADER: u32 = 0x1;
pub const PLUGIN_FLAG_PICWRITER: u32 = 0x2;

// Actions passed to `clockstamp_plugin_act`
pub const PLUGIN_ACTION_INIT: c_uint = 0;
pub const PLUGIN_ACTION_UNINIT: c_uint = 1;
pub const PLUGIN_ACTION_STARTREC: c_uint = 2;
pub const PLUGIN_ACTION_PAUSE: c_uint = 3;
pub const PLUGIN_ACTION_ENDREC: c_uint = 4;
pub const PLUGIN_ACTION_PICREAD: c_uint = 5;
pub const PLUGIN_ACTION_PICWRITE: c_uint = 6;
pub const PLUGIN_ACTION_SETTINGS: c_uint = 7;

// Identity reported during the load handshake
pub const PLUGIN_VERSION: u32 = 1;
pub const PRODUCT_NAME: &str = "Clock";
pub const FILENAME: &str = "Clock.yap";
pub const COMPANY: &str = "Clockstamp Contributors";
pub const COPYRIGHT: &str = "Copyright (C) Clockstamp Contributors";

/// Handshake block shared by host and plugin
#[repr(C)]
pub struct PluginInfo {
    // Filled by the host
    pub framework_version: u32,
    pub framework_name: [c_char; 32],
    pub framework_instance: *mut c_void,

    // Filled by the plugin
    pub plugin_version: u32,
    pub plugin_product_name: [c_char; 64],
    pub plugin_filename: [c_char; 32],
    pub plugin_company: [c_char; 64],
    pub plugin_copyright: [c_char; 128],
    /// Opaque per-instance plugin state
    pub plugin_instance: *mut c_void,
    pub plugin_window: *mut c_void,
    pub flags: u32,
    pub enabled: c_int,
}

/// A captured frame handed to `PLUGIN_ACTION_PICWRITE`
#[repr(C)]
pub struct HostFrame {
    /// Row-major pixels, `stride` bytes per row
    pub data: *mut u8,
    pub width: u32,
    pub height: u32,
    pub stride: usize,
    /// 3 (BGR) or 4 (BGRA)
    pub channels: u32,
}

/// Complete settings published by the host's settings dialog
#[repr(C)]
pub struct HostSettings {
    pub margin_percent: c_int,
    /// 0 = left, 1 = center, 2 = right
    pub align: c_uint,
    /// 0 = top, 1 = middle, 2 = bottom
    pub valign: c_uint,
    pub scale: f64,
    /// NUL-terminated caption template; NULL keeps the current one
    pub caption: *const c_char,
}

/// Copies `src` into a fixed C string field, truncating and NUL-terminating it
pub fn write_c_str(dst: &mut [c_char], src: &str) {
    let Some(max) = dst.len().checked_sub(1) else {
        return;
    };
    let bytes = src.as_bytes();
    let len = bytes.len().min(max);

    for (d, &b) in dst.iter_mut().zip(&bytes[..len]) {
        *d = b as c_char;
    }
    dst[len] = 0;
}

/// Reads a fixed C string field, stopping at the first NUL
pub fn read_c_str(src: &[c_char]) -> String {
    let bytes: Vec<u8> = src.iter().take_while(|&&c| c != 0).map(|&c| c as u8).collect();
    String::from_utf8_lossy(&bytes).into_owned()
}
