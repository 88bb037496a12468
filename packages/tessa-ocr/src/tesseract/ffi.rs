use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_uchar};
use std::path::Path;
use std::ptr::NonNull;

use crate::engine::OcrError;

#[repr(C)]
struct TessBaseAPI {
    _private: [u8; 0],
}

extern "C" {
    fn TessBaseAPICreate() -> *mut TessBaseAPI;
    fn TessBaseAPIDelete(handle: *mut TessBaseAPI);
    fn TessBaseAPIEnd(handle: *mut TessBaseAPI);

    fn TessBaseAPIInit2(
        handle: *mut TessBaseAPI,
        datapath: *const c_char,
        language: *const c_char,
        oem: c_int,
    ) -> c_int;
    fn TessBaseAPISetPageSegMode(handle: *mut TessBaseAPI, mode: c_int);
    fn TessBaseAPISetVariable(
        handle: *mut TessBaseAPI,
        name: *const c_char,
        value: *const c_char,
    ) -> c_int;
    fn TessBaseAPIReadConfigFile(handle: *mut TessBaseAPI, filename: *const c_char);

    fn TessBaseAPISetImage(
        handle: *mut TessBaseAPI,
        imagedata: *const c_uchar,
        width: c_int,
        height: c_int,
        bytes_per_pixel: c_int,
        bytes_per_line: c_int,
    );
    fn TessBaseAPISetSourceResolution(handle: *mut TessBaseAPI, ppi: c_int);
    fn TessBaseAPISetRectangle(
        handle: *mut TessBaseAPI,
        left: c_int,
        top: c_int,
        width: c_int,
        height: c_int,
    );
    fn TessBaseAPIGetUTF8Text(handle: *mut TessBaseAPI) -> *mut c_char;
    fn TessBaseAPIClear(handle: *mut TessBaseAPI);
    fn TessDeleteText(text: *const c_char);
}

fn c_string(value: &str, what: &str) -> Result<CString, OcrError> {
    CString::new(value).map_err(|_| OcrError::Configure(format!("null byte in {what}")))
}

fn c_path(path: &Path, what: &str) -> Result<CString, OcrError> {
    let s = path
        .to_str()
        .ok_or_else(|| OcrError::Configure(format!("non-utf8 {what}")))?;
    c_string(s, what)
}

fn c_dim(value: u32, what: &str) -> Result<c_int, OcrError> {
    c_int::try_from(value).map_err(|_| OcrError::SetImage(format!("{what} {value} exceeds C int")))
}

/// Owned `TessBaseAPI*`. Deleted on drop.
pub(super) struct Handle(NonNull<TessBaseAPI>);

// SAFETY: the handle is uniquely owned and only used through `&mut self`;
// Tesseract instances may move between threads as long as calls are not
// concurrent.
unsafe impl Send for Handle {}

impl Handle {
    pub(super) fn create() -> Result<Self, OcrError> {
        // SAFETY: plain constructor with no preconditions.
        let raw = unsafe { TessBaseAPICreate() };
        NonNull::new(raw)
            .map(Handle)
            .ok_or_else(|| OcrError::Create("TessBaseAPICreate returned null".into()))
    }

    fn raw(&self) -> *mut TessBaseAPI {
        self.0.as_ptr()
    }

    pub(super) fn init(
        &mut self,
        data_path: Option<&Path>,
        language: &str,
        oem: i32,
    ) -> Result<(), OcrError> {
        let data_path = data_path.map(|p| c_path(p, "data path")).transpose()?;
        let language = c_string(language, "language")?;
        let data_ptr = data_path.as_ref().map_or(std::ptr::null(), |p| p.as_ptr());

        // SAFETY: both strings outlive the call; a null datapath is allowed.
        let status = unsafe { TessBaseAPIInit2(self.raw(), data_ptr, language.as_ptr(), oem) };
        if status != 0 {
            return Err(OcrError::Configure(format!(
                "could not load language '{}' (data path {:?})",
                language.to_string_lossy(),
                data_path,
            )));
        }
        Ok(())
    }

    pub(super) fn set_page_seg_mode(&mut self, mode: i32) {
        // SAFETY: the handle is live.
        unsafe { TessBaseAPISetPageSegMode(self.raw(), mode) }
    }

    pub(super) fn set_variable(&mut self, name: &str, value: &str) -> Result<(), OcrError> {
        let c_name = c_string(name, "variable name")?;
        let c_value = c_string(value, "variable value")?;
        // SAFETY: both strings outlive the call.
        let ok = unsafe { TessBaseAPISetVariable(self.raw(), c_name.as_ptr(), c_value.as_ptr()) };
        if ok == 0 {
            return Err(OcrError::Configure(format!("unknown variable '{name}'")));
        }
        Ok(())
    }

    pub(super) fn read_config_file(&mut self, path: &Path) -> Result<(), OcrError> {
        let c_file = c_path(path, "config path")?;
        // SAFETY: the string outlives the call.
        unsafe { TessBaseAPIReadConfigFile(self.raw(), c_file.as_ptr()) };
        Ok(())
    }

    /// The engine keeps a pointer to `data` until `clear` is called.
    pub(super) fn set_image(
        &mut self,
        data: &[u8],
        width: u32,
        height: u32,
        bytes_per_pixel: u32,
        bytes_per_line: u32,
    ) -> Result<(), OcrError> {
        let width = c_dim(width, "width")?;
        let height = c_dim(height, "height")?;
        let bpp = c_dim(bytes_per_pixel, "bytes per pixel")?;
        let bpl = c_dim(bytes_per_line, "bytes per line")?;
        // SAFETY: `data` holds at least bytes_per_line * height bytes, which
        // `Image` validated on construction.
        unsafe { TessBaseAPISetImage(self.raw(), data.as_ptr(), width, height, bpp, bpl) };
        Ok(())
    }

    pub(super) fn set_source_resolution(&mut self, ppi: u32) -> Result<(), OcrError> {
        let ppi = c_int::try_from(ppi)
            .map_err(|_| OcrError::SetResolution(format!("{ppi} ppi exceeds C int")))?;
        // SAFETY: the handle is live.
        unsafe { TessBaseAPISetSourceResolution(self.raw(), ppi) };
        Ok(())
    }

    pub(super) fn set_rectangle(&mut self, left: i32, top: i32, width: i32, height: i32) {
        // SAFETY: the handle is live; the engine clips the rectangle itself.
        unsafe { TessBaseAPISetRectangle(self.raw(), left, top, width, height) }
    }

    pub(super) fn utf8_text(&mut self) -> Result<String, OcrError> {
        // SAFETY: the handle is live and an image has been set.
        let text = unsafe { TessBaseAPIGetUTF8Text(self.raw()) };
        if text.is_null() {
            return Err(OcrError::Recognize("engine returned no text".into()));
        }
        // SAFETY: non-null, NUL-terminated and owned by us until TessDeleteText.
        let owned = unsafe { CStr::from_ptr(text) }.to_string_lossy().into_owned();
        unsafe { TessDeleteText(text) };
        Ok(owned)
    }

    pub(super) fn clear(&mut self) {
        // SAFETY: the handle is live.
        unsafe { TessBaseAPIClear(self.raw()) }
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        // SAFETY: we are the only owner; the pointer is not used afterwards.
        unsafe {
            TessBaseAPIEnd(self.raw());
            TessBaseAPIDelete(self.raw());
        }
    }
}
