//! Capability probe.

use crate::core::SymbolTable;
use crate::linker::HostApi;

/// Ask the backend whether usable devices exist.
///
/// The backend's link entry point receives the host's registration
/// interface and reports `true` only when real hardware was found. A
/// `false` answer means the library itself is fine but this machine has
/// nothing for it to drive.
pub fn probe(table: &SymbolTable, api: HostApi) -> bool {
    // SAFETY: `link` was bound from the backend library by `SymbolTable::bind`
    // and the library is still loaded while the table is borrowed.
    unsafe { (table.link)(api.as_ptr()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fake_exports;

    #[test]
    fn test_probe_answers() {
        let yes = SymbolTable::bind(&fake_exports(true)).unwrap();
        let no = SymbolTable::bind(&fake_exports(false)).unwrap();
        assert!(probe(&yes, HostApi::null()));
        assert!(!probe(&no, HostApi::null()));
    }
}
