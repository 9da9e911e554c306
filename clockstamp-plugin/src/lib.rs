//! Clockstamp capture plugin
//!
//! Exposes the C-ABI entry points (`clockstamp_plugin_*`) the capture host
//! calls. Each loaded instance owns its own [`PluginState`], stored behind
//! the `plugin_instance` pointer of the handshake block.

pub mod host_abi;
pub mod state;

use clockstamp_render::{required_len, FrameView};
use host_abi::*;
use libc::{c_int, c_uint, c_void, intptr_t};
use std::ffi::CStr;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use tracing::{debug, warn};

pub use state::{default_typeface, open_default_store, PluginState, FONT_ENV, SETTINGS_ENV};

/// Resolves the instance stored in a handshake block
///
/// # Safety
/// `info` must be null or point to a live `PluginInfo` whose
/// `plugin_instance` was set by [`clockstamp_plugin_load`].
unsafe fn instance<'a>(info: *mut PluginInfo) -> Option<&'a PluginState> {
    if info.is_null() {
        return None;
    }
    let handle = unsafe { (*info).plugin_instance } as *const PluginState;
    if handle.is_null() {
        return None;
    }
    Some(unsafe { &*handle })
}

// ──────────────────── C-ABI functions ────────────────────

/// Load handshake. Validates the host, fills in the plugin identity and
/// creates the instance state. Returns TRUE on success.
#[no_mangle]
pub unsafe extern "C" fn clockstamp_plugin_load(
    info: *mut PluginInfo,
    _lparam: intptr_t,
) -> c_int {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        if info.is_null() {
            return FALSE;
        }
        let info = unsafe { &mut *info };

        if info.framework_version < FRAMEWORK_VERSION {
            warn!(version = info.framework_version, "framework too old");
            return FALSE;
        }
        let name = read_c_str(&info.framework_name);
        if !name.eq_ignore_ascii_case(FRAMEWORK_NAME) {
            warn!(name = %name, "unknown framework");
            return FALSE;
        }
        if info.framework_instance.is_null() {
            warn!("framework instance missing");
            return FALSE;
        }

        info.plugin_version = PLUGIN_VERSION;
        write_c_str(&mut info.plugin_product_name, PRODUCT_NAME);
        write_c_str(&mut info.plugin_filename, FILENAME);
        write_c_str(&mut info.plugin_company, COMPANY);
        write_c_str(&mut info.plugin_copyright, COPYRIGHT);
        info.plugin_window = ptr::null_mut();
        info.flags = PLUGIN_FLAG_PICREADER | PLUGIN_FLAG_PICWRITER;
        info.enabled = TRUE;

        let state = Box::new(PluginState::new(Box::new(open_default_store)));
        info.plugin_instance = Box::into_raw(state) as *mut c_void;
        TRUE
    }));

    result.unwrap_or(FALSE)
}

/// Releases the instance state. Settings are saved by `PLUGIN_ACTION_UNINIT`,
/// not here.
#[no_mangle]
pub unsafe extern "C" fn clockstamp_plugin_unload(
    info: *mut PluginInfo,
    _lparam: intptr_t,
) -> c_int {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        if info.is_null() {
            return TRUE;
        }
        let info = unsafe { &mut *info };
        if !info.plugin_instance.is_null() {
            let _ = unsafe { Box::from_raw(info.plugin_instance as *mut PluginState) };
            info.plugin_instance = ptr::null_mut();
        }
        TRUE
    }));

    result.unwrap_or(FALSE)
}

/// Dispatches a host action.
///
/// For `PLUGIN_ACTION_PICWRITE`, `wparam` points to a [`HostFrame`]. The
/// frame callback always returns 0; a frame that cannot be painted is
/// skipped so capture continues.
#[no_mangle]
pub unsafe extern "C" fn clockstamp_plugin_act(
    info: *mut PluginInfo,
    action: c_uint,
    wparam: *mut c_void,
    _lparam: intptr_t,
) -> intptr_t {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let Some(state) = (unsafe { instance(info) }) else {
            return 0;
        };

        match action {
            PLUGIN_ACTION_INIT => intptr_t::from(state.init()),
            PLUGIN_ACTION_UNINIT => intptr_t::from(state.uninit()),
            PLUGIN_ACTION_PICWRITE => {
                unsafe { write_picture(state, wparam as *mut HostFrame) };
                0
            }
            // Recording state changes and frame reads need no work; the
            // settings dialog belongs to the host.
            PLUGIN_ACTION_STARTREC
            | PLUGIN_ACTION_PAUSE
            | PLUGIN_ACTION_ENDREC
            | PLUGIN_ACTION_PICREAD
            | PLUGIN_ACTION_SETTINGS => 0,
            other => {
                debug!(action = other, "unhandled plugin action");
                0
            }
        }
    }));

    result.unwrap_or(0)
}

/// Publishes a complete set of settings from the host's settings dialog.
/// Safe to call while frames are being written on another thread.
#[no_mangle]
pub unsafe extern "C" fn clockstamp_plugin_apply_settings(
    info: *mut PluginInfo,
    settings: *const HostSettings,
) -> c_int {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let Some(state) = (unsafe { instance(info) }) else {
            return FALSE;
        };
        if settings.is_null() {
            return FALSE;
        }
        let settings = unsafe { &*settings };

        let caption = if settings.caption.is_null() {
            None
        } else {
            let raw = unsafe { CStr::from_ptr(settings.caption) };
            Some(raw.to_string_lossy().into_owned())
        };

        state.apply_settings(
            settings.margin_percent,
            settings.align,
            settings.valign,
            settings.scale,
            caption,
        );
        TRUE
    }));

    result.unwrap_or(FALSE)
}

/// Records where the host's settings window was last shown
#[no_mangle]
pub unsafe extern "C" fn clockstamp_plugin_set_window_position(
    info: *mut PluginInfo,
    x: c_int,
    y: c_int,
) -> c_int {
    let result = panic::catch_unwind(AssertUnwindSafe(|| match unsafe { instance(info) } {
        Some(state) => {
            state.set_window_position(x, y);
            TRUE
        }
        None => FALSE,
    }));

    result.unwrap_or(FALSE)
}

/// Paints the caption onto a host frame, skipping frames that cannot be wrapped
///
/// # Safety
/// `frame` must be null or point to a `HostFrame` whose `data` covers
/// `stride * (height - 1) + width * channels` writable bytes.
unsafe fn write_picture(state: &PluginState, frame: *mut HostFrame) {
    if frame.is_null() {
        return;
    }
    let frame = unsafe { &*frame };
    if frame.data.is_null() {
        return;
    }

    let len = match required_len(frame.width, frame.height, frame.stride, frame.channels) {
        Ok(len) => len,
        Err(e) => {
            warn!("skipping frame: {e}");
            return;
        }
    };

    let data = unsafe { std::slice::from_raw_parts_mut(frame.data, len) };
    match FrameView::new(data, frame.width, frame.height, frame.stride, frame.channels) {
        Ok(mut view) => {
            state.write_picture(&mut view);
        }
        Err(e) => warn!("skipping frame: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libc::c_char;
    use std::ffi::CString;

    fn host_info(version: u32, name: &str, instance: *mut c_void) -> PluginInfo {
        let mut info = PluginInfo {
            framework_version: version,
            framework_name: [0; 32],
            framework_instance: instance,
            plugin_version: 0,
            plugin_product_name: [0; 64],
            plugin_filename: [0; 32],
            plugin_company: [0; 64],
            plugin_copyright: [0; 128],
            plugin_instance: ptr::null_mut(),
            plugin_window: ptr::null_mut(),
            flags: 0,
            enabled: 0,
        };
        write_c_str(&mut info.framework_name, name);
        info
    }

    fn host_instance() -> *mut c_void {
        static HOST: u8 = 0;
        &HOST as *const u8 as *mut c_void
    }

    #[test]
    fn test_load_fills_identity() {
        let mut info = host_info(FRAMEWORK_VERSION, "pluginframework", host_instance());

        unsafe {
            assert_eq!(clockstamp_plugin_load(&mut info, 0), TRUE);
        }
        assert_eq!(read_c_str(&info.plugin_product_name), "Clock");
        assert_eq!(read_c_str(&info.plugin_filename), "Clock.yap");
        assert_eq!(info.flags, PLUGIN_FLAG_PICREADER | PLUGIN_FLAG_PICWRITER);
        assert_eq!(info.enabled, TRUE);
        assert!(!info.plugin_instance.is_null());

        unsafe {
            assert_eq!(clockstamp_plugin_unload(&mut info, 0), TRUE);
        }
        assert!(info.plugin_instance.is_null());
    }

    #[test]
    fn test_load_rejects_bad_hosts() {
        let mut old = host_info(0, FRAMEWORK_NAME, host_instance());
        let mut wrong_name = host_info(FRAMEWORK_VERSION, "OtherFramework", host_instance());
        let mut no_instance = host_info(FRAMEWORK_VERSION, FRAMEWORK_NAME, ptr::null_mut());

        unsafe {
            assert_eq!(clockstamp_plugin_load(&mut old, 0), FALSE);
            assert_eq!(clockstamp_plugin_load(&mut wrong_name, 0), FALSE);
            assert_eq!(clockstamp_plugin_load(&mut no_instance, 0), FALSE);
            assert_eq!(clockstamp_plugin_load(ptr::null_mut(), 0), FALSE);
        }
        assert!(old.plugin_instance.is_null());
    }

    #[test]
    fn test_picwrite_paints_frame_and_tolerates_bad_frames() {
        let mut info = host_info(FRAMEWORK_VERSION, FRAMEWORK_NAME, host_instance());
        unsafe {
            assert_eq!(clockstamp_plugin_load(&mut info, 0), TRUE);
        }

        let (width, height) = (400u32, 300u32);
        let stride = width as usize * 4 + 16;
        let mut pixels = vec![100u8; stride * height as usize];
        let mut frame = HostFrame {
            data: pixels.as_mut_ptr(),
            width,
            height,
            stride,
            channels: 4,
        };

        unsafe {
            let status = clockstamp_plugin_act(
                &mut info,
                PLUGIN_ACTION_PICWRITE,
                &mut frame as *mut HostFrame as *mut c_void,
                0,
            );
            assert_eq!(status, 0);
        }
        assert!(pixels.iter().any(|&b| b == 255));

        let mut broken = HostFrame {
            data: ptr::null_mut(),
            width,
            height,
            stride,
            channels: 4,
        };
        let mut odd = HostFrame {
            data: pixels.as_mut_ptr(),
            width,
            height,
            stride,
            channels: 2,
        };
        unsafe {
            for frame in [&mut broken, &mut odd] {
                let status = clockstamp_plugin_act(
                    &mut info,
                    PLUGIN_ACTION_PICWRITE,
                    frame as *mut HostFrame as *mut c_void,
                    0,
                );
                assert_eq!(status, 0);
            }
            assert_eq!(
                clockstamp_plugin_act(&mut info, PLUGIN_ACTION_PICWRITE, ptr::null_mut(), 0),
                0
            );
            clockstamp_plugin_unload(&mut info, 0);
        }
    }

    #[test]
    fn test_apply_settings_through_abi() {
        let mut info = host_info(FRAMEWORK_VERSION, FRAMEWORK_NAME, host_instance());
        unsafe {
            assert_eq!(clockstamp_plugin_load(&mut info, 0), TRUE);
        }

        let caption = CString::new("&y/&M/&d").unwrap();
        let settings = HostSettings {
            margin_percent: 5,
            align: 0,
            valign: 2,
            scale: 0.3,
            caption: caption.as_ptr() as *const c_char,
        };

        unsafe {
            assert_eq!(clockstamp_plugin_apply_settings(&mut info, &settings), TRUE);
            assert_eq!(clockstamp_plugin_apply_settings(&mut info, ptr::null()), FALSE);
            assert_eq!(clockstamp_plugin_set_window_position(&mut info, 3, 4), TRUE);

            let state = instance(&mut info).unwrap();
            let layout = state.config().snapshot();
            assert_eq!(layout.margin_percent, 5);
            assert_eq!(layout.template, "&y/&M/&d");
            assert_eq!(layout.scale, 0.3);
            assert_eq!(
                state.config().window_position(),
                Some(clockstamp_config::WindowPosition { x: 3, y: 4 })
            );

            clockstamp_plugin_unload(&mut info, 0);
        }
    }

    #[test]
    fn test_actions_without_instance() {
        unsafe {
            assert_eq!(
                clockstamp_plugin_act(ptr::null_mut(), PLUGIN_ACTION_INIT, ptr::null_mut(), 0),
                0
            );
            assert_eq!(
                clockstamp_plugin_set_window_position(ptr::null_mut(), 0, 0),
                FALSE
            );
            assert_eq!(clockstamp_plugin_unload(ptr::null_mut(), 0), TRUE);
        }
    }

    #[test]
    fn test_unload_twice_is_harmless() {
        let mut info = host_info(FRAMEWORK_VERSION, FRAMEWORK_NAME, host_instance());
        unsafe {
            assert_eq!(clockstamp_plugin_load(&mut info, 0), TRUE);
            assert_eq!(clockstamp_plugin_unload(&mut info, 0), TRUE);
            assert_eq!(clockstamp_plugin_unload(&mut info, 0), TRUE);
            assert_eq!(clockstamp_plugin_set_window_position(&mut info, 1, 2), FALSE);
        }
    }
}
