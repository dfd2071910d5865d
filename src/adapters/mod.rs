//! Infrastructure adapters. Vendor pieces, stores, terminal UI.
//!
//! Kommo and Zagomail HTTP clients map transport failures to DomainError.

pub mod http;
pub mod kommo;
pub mod persistence;
pub mod props;
pub mod ui;
pub mod zagomail;

use crate::usecases::PieceRegistry;

/// Registry holding every built-in piece.
pub fn builtin_registry() -> PieceRegistry {
    let mut registry = PieceRegistry::new();
    registry.register(kommo::piece());
    registry.register(zagomail::piece());
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_has_both_pieces() {
        let registry = builtin_registry();
        assert!(registry.action("kommo", "find_company").is_ok());
        assert!(registry.trigger("zagomail", "subscriber_tagged").is_ok());
        assert_eq!(registry.pieces().len(), 2);
    }
}
