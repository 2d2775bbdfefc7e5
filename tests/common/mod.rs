use ldif_store::{Backend, Dn, Entry};
use tempfile::TempDir;

/// A throwaway backend rooted at a fresh temp directory, with the suffix
/// entry already created — the starting point most integration tests need.
pub struct Fixture {
    pub tempdir: TempDir,
    pub backend: Backend,
    pub suffix: Dn,
}

impl Fixture {
    pub fn new() -> Self {
        let tempdir = TempDir::new().expect("create temp dir");
        let suffix = Dn::parse("dc=example,dc=com");
        let config = ldif_store::config::Config::from_directory(tempdir.path().to_path_buf())
            .expect("valid config");
        let backend = Backend::open(config, suffix.clone()).expect("open backend");

        let mut root = Entry::new("dc=example,dc=com".into(), suffix.clone());
        root.add_value("objectClass", "domain".into());
        root.add_value("dc", "example".into());
        ldif_store::ops::add(&backend, root).expect("create suffix entry");

        Fixture { tempdir, backend, suffix }
    }

    pub fn add_person(&self, cn: &str) -> Dn {
        let dn = self.suffix_child(&format!("cn={cn}"));
        let mut entry = Entry::new(dn.to_string(), dn.clone());
        entry.add_value("objectClass", "person".into());
        entry.add_value("cn", cn.into());
        ldif_store::ops::add(&self.backend, entry).expect("add person entry");
        dn
    }

    pub fn suffix_child(&self, rdn: &str) -> Dn {
        self.suffix.with_leaf(&Dn::parse(rdn))
    }
}
