//! Scan policy: path exclusions, size limits, trusted publishers

use std::path::Path;

/// Files larger than this are skipped entirely (policy notice)
pub const MAX_SCAN_SIZE: u64 = 500 * 1024 * 1024;

/// Path fragments that are never scanned. Matched case-insensitively as
/// substrings of the lowercased path; the engine's own working directories
/// and artifacts are listed so it does not scan itself.
const EXCLUDED_PATH_FRAGMENTS: &[&str] = &[
    "c:\\programdata\\pbl4_av_data",
    "\\device\\",
    "\\windows\\system32",
    "\\windows\\winsxs",
    "\\$recycle.bin",
    "system volume information",
    "\\appdata\\local\\temp",
    "node_modules",
    ".git",
    "all_rules.yarc",
    "full_hash.db",
    "pbl4_client.exe",
];

/// Signer display-name substrings accepted by the trusted-publisher gate
const TRUSTED_SIGNERS: &[&str] = &["microsoft", "google", "apple", "intel", "amazon"];

/// True when the path contains any excluded fragment
pub fn is_excluded_path(path: &Path) -> bool {
    let lowered = path.to_string_lossy().to_lowercase();
    EXCLUDED_PATH_FRAGMENTS
        .iter()
        .any(|fragment| lowered.contains(fragment))
}

/// Code-signature trust gate. On platforms exposing a signature API the
/// file's signature is verified (no UI, no revocation checks) and the leaf
/// signer's display name is matched against the allow-list. Any failure
/// means "not trusted"; platforms without a signature API always return
/// false.
pub fn is_trusted_publisher(path: &Path) -> bool {
    platform::verify_trusted_signer(path)
}

#[cfg(windows)]
mod platform {
    use super::TRUSTED_SIGNERS;
    use std::os::windows::ffi::OsStrExt;
    use std::path::Path;
    use std::ptr;
    use winapi::shared::guiddef::GUID;
    use winapi::um::wincrypt::CERT_NAME_SIMPLE_DISPLAY_TYPE;
    use winapi::um::wintrust::{
        WTHelperGetProvCertFromChain, WTHelperGetProvSignerFromChain,
        WTHelperProvDataFromStateData, WinVerifyTrust, WINTRUST_DATA, WINTRUST_FILE_INFO,
        WTD_CHOICE_FILE, WTD_REVOCATION_CHECK_NONE, WTD_REVOKE_NONE, WTD_STATEACTION_CLOSE,
        WTD_STATEACTION_VERIFY, WTD_UI_NONE,
    };

    // WINTRUST_ACTION_GENERIC_VERIFY_V2
    const VERIFY_V2: GUID = GUID {
        Data1: 0x00AAC56B,
        Data2: 0xCD44,
        Data3: 0x11d0,
        Data4: [0x8C, 0xC2, 0x00, 0xC0, 0x4F, 0xC2, 0x95, 0xEE],
    };

    pub fn verify_trusted_signer(path: &Path) -> bool {
        let wide: Vec<u16> = path
            .as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();

        unsafe {
            let mut file_info: WINTRUST_FILE_INFO = std::mem::zeroed();
            file_info.cbStruct = std::mem::size_of::<WINTRUST_FILE_INFO>() as u32;
            file_info.pcwszFilePath = wide.as_ptr();

            let mut data: WINTRUST_DATA = std::mem::zeroed();
            data.cbStruct = std::mem::size_of::<WINTRUST_DATA>() as u32;
            data.dwUIChoice = WTD_UI_NONE;
            data.fdwRevocationChecks = WTD_REVOKE_NONE;
            data.dwUnionChoice = WTD_CHOICE_FILE;
            *data.u.pFile_mut() = &mut file_info;
            data.dwStateAction = WTD_STATEACTION_VERIFY;
            data.dwProvFlags = WTD_REVOCATION_CHECK_NONE;

            let mut action = VERIFY_V2;
            let status = WinVerifyTrust(ptr::null_mut(), &mut action, &mut data as *mut _ as _);

            let trusted = status == 0 && signer_name_is_trusted(&data);

            data.dwStateAction = WTD_STATEACTION_CLOSE;
            WinVerifyTrust(ptr::null_mut(), &mut action, &mut data as *mut _ as _);

            trusted
        }
    }

    unsafe fn signer_name_is_trusted(data: &WINTRUST_DATA) -> bool {
        let prov_data = WTHelperProvDataFromStateData(data.hWVTStateData);
        if prov_data.is_null() {
            return false;
        }
        let signer = WTHelperGetProvSignerFromChain(prov_data, 0, 0, 0);
        if signer.is_null() {
            return false;
        }
        let cert = WTHelperGetProvCertFromChain(signer, 0);
        if cert.is_null() || (*cert).pCert.is_null() {
            return false;
        }

        let mut name_buf = [0u16; 512];
        let len = winapi::um::wincrypt::CertGetNameStringW(
            (*cert).pCert,
            CERT_NAME_SIMPLE_DISPLAY_TYPE,
            0,
            ptr::null_mut(),
            name_buf.as_mut_ptr(),
            name_buf.len() as u32,
        );
        if len <= 1 {
            return false;
        }
        let name = String::from_utf16_lossy(&name_buf[..(len as usize - 1)]).to_lowercase();
        TRUSTED_SIGNERS.iter().any(|s| name.contains(s))
    }
}

#[cfg(not(windows))]
mod platform {
    use std::path::Path;

    pub fn verify_trusted_signer(_path: &Path) -> bool {
        false
    }
}
