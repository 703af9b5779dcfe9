#![cfg(not(target_arch = "wasm32"))]

use core::num::NonZeroI32;

use chip8_host_bridge::{translate, FaultCategory};
use proptest::prelude::*;

fn nonzero() -> impl Strategy<Value = NonZeroI32> {
    any::<i32>().prop_filter_map("nonzero", NonZeroI32::new)
}

proptest! {
    #[test]
    fn translate_is_deterministic(code in nonzero(), name in "[A-Z0-9_]{1,12}") {
        prop_assert_eq!(translate(code, &name), translate(code, &name));
    }

    #[test]
    fn program_name_only_matters_for_downloads(
        code in nonzero(),
        a in "[A-Z]{1,8}",
        b in "[A-Z]{1,8}",
    ) {
        let left = translate(code, &a);
        let right = translate(code, &b);
        prop_assert_eq!(left.code, code);
        prop_assert_eq!(left.category, right.category);
        if code.get() <= 100 {
            prop_assert_eq!(left.message, right.message);
        }
    }

    #[test]
    fn codes_above_100_are_network_faults(code in 101i32.., name in "[A-Z]{1,8}") {
        let record = translate(NonZeroI32::new(code).unwrap(), &name);
        prop_assert_eq!(record.category, FaultCategory::Network);
        prop_assert_eq!(record.message, format!("Failed to download program: {name}"));
    }

    #[test]
    fn unknown_codes_are_general(code in nonzero()) {
        prop_assume!(!matches!(code.get(), 51..=53) && code.get() <= 100);
        let record = translate(code, "PONG");
        prop_assert_eq!(record.category, FaultCategory::General);
        prop_assert_eq!(record.message, "General error");
    }
}
