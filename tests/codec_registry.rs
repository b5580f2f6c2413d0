use tn5250r_core::codec::*;
use tn5250r_core::error::EncodingError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_lookup() {
        let registry = CodecRegistry::builtin();
        assert_eq!(registry.ids().len(), 23);
        for id in ["37", "273", "285", "297", "424", "500", "870", "875", "930", "939", "1025", "1140", "1141", "1148"] {
            assert!(registry.contains(id), "missing {id}");
        }
        for alias in ["37", "037", "cp037", "IBM-037", "CCSID 37"] {
            assert_eq!(registry.get(alias).unwrap().id(), "37", "alias {alias}");
        }
        assert_eq!(
            registry.get("1047").unwrap_err(),
            EncodingError::UnknownCodepage("1047".to_string())
        );
        assert!(registry.get("939").unwrap().is_double_byte());
        assert!(!registry.get("1140").unwrap().is_double_byte());
    }

    #[test]
    fn test_double_byte_pair_decodes_to_single_character() {
        let codec = CodecRegistry::builtin().get("939").unwrap();
        let (diagnostics, mut reports) = Diagnostics::channel();

        let text = codec.decode(&[SHIFT_OUT, 0x42, 0xC1, SHIFT_IN], &diagnostics);
        assert_eq!(text.chars().count(), 1);
        assert_eq!(text, "\u{FF21}");
        assert!(reports.try_recv().is_err());

        // Unmappable pair: replaced, reported, never an error
        let text = codec.decode(&[SHIFT_OUT, 0x7F, 0x7F, SHIFT_IN], &diagnostics);
        assert_eq!(text, REPLACEMENT_CHAR.to_string());
        assert!(matches!(reports.try_recv(), Ok(EncodingError::UnmappableBytes { .. })));
    }

    #[test]
    fn test_euro_sign_only_on_euro_pages() {
        let registry = CodecRegistry::builtin();
        let diagnostics = Diagnostics::disabled();
        assert_eq!(registry.get("1140").unwrap().encode("\u{20AC}", &diagnostics), vec![0x9F]);
        assert_eq!(registry.get("1148").unwrap().encode("\u{20AC}", &diagnostics), vec![0x9F]);
        assert_eq!(registry.get("37").unwrap().encode("\u{20AC}", &diagnostics), vec![SUBSTITUTE_BYTE]);
    }

    #[test]
    fn test_national_pages_share_the_invariant_set() {
        let registry = CodecRegistry::builtin();
        let diagnostics = Diagnostics::disabled();
        let reference = registry.get("37").unwrap().encode("HELLO 2024", &diagnostics);
        for id in registry.ids() {
            let codec = registry.get(id).unwrap();
            if codec.is_double_byte() {
                continue;
            }
            assert_eq!(codec.decode(&reference, &diagnostics), "HELLO 2024", "codec {id}");
        }
        // Where pages differ, the same byte means different things
        assert_eq!(registry.get("273").unwrap().decode(&[0x4A], &diagnostics), "\u{00C4}");
        assert_eq!(registry.get("297").unwrap().decode(&[0x4A], &diagnostics), "\u{00B0}");
    }

    #[test]
    fn test_custom_codec_registration() {
        let custom = SingleByteCodec::cp037()
            .with_id("9037", "CP037 with a private mapping")
            .with_overrides(&[(0x41, '\u{2022}')]);
        let registry = CodecRegistry::builder().with_builtins().register(custom).build();

        let codec = registry.get("9037").unwrap();
        assert_eq!(codec.decode(&[0x41, 0xC1], &Diagnostics::disabled()), "\u{2022}A");
        // Built-ins are untouched
        assert_eq!(registry.get("37").unwrap().decode(&[0x41], &Diagnostics::disabled()), "\u{A0}");
    }

    #[test]
    fn test_sessions_share_codec_instances() {
        let registry = CodecRegistry::builtin();
        let a = registry.get("500").unwrap();
        let b = registry.clone().get("cp500").unwrap();
        assert!(std::sync::Arc::ptr_eq(&a, &b));
    }
}
