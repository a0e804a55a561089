/// One store of the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Store {
    /// Opaque identifier submitted with every upload
    pub id: &'static str,

    /// Display name
    pub name: &'static str,

    /// City / mall
    pub location: &'static str,
}

/// Static registry; loaded at startup, never persisted back
const STORES: &[Store] = &[
    Store {
        id: "loja1",
        name: "Loja1",
        location: "Shopping Morumbi - São Paulo",
    },
    Store {
        id: "loja2",
        name: "Loja2",
        location: "Shopping Ibirapuera - São Paulo",
    },
    Store {
        id: "loja3",
        name: "Loja3",
        location: "Shopping Iguatemi - Campinas",
    },
    Store {
        id: "loja4",
        name: "Loja4",
        location: "BarraShopping - Rio de Janeiro",
    },
    Store {
        id: "loja5",
        name: "Loja5",
        location: "Shopping Curitiba - Curitiba",
    },
];

/// Ordered store list
pub fn list() -> &'static [Store] {
    STORES
}

/// Look a store up by id
pub fn find(id: &str) -> Option<&'static Store> {
    STORES.iter().find(|s| s.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_is_ordered_and_nonempty() {
        let stores = list();
        assert!(!stores.is_empty());
        assert_eq!(stores[0].id, "loja1");
    }

    #[test]
    fn test_ids_are_unique() {
        let stores = list();
        for (i, a) in stores.iter().enumerate() {
            for b in &stores[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn test_find() {
        assert_eq!(find("loja2").unwrap().location, "Shopping Ibirapuera - São Paulo");
        assert!(find("loja99").is_none());
    }
}
