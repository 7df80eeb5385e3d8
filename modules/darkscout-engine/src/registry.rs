//! Curated catalogue of dark-web sources the scanner probes.
//!
//! The catalogue is compile-time data: every target carries a name, a URL
//! template with a `{query}` placeholder, a category, and a short note on
//! what the source is. Onion services churn constantly, so entries here are
//! best-effort snapshots; an unreachable target is a soft failure at scan
//! time, not a registry error.

use darkscout_common::TargetCategory;

/// One remote endpoint probed for the identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSite {
    pub name: &'static str,
    pub url_template: &'static str,
    pub category: TargetCategory,
    pub description: &'static str,
}

impl TargetSite {
    /// Substitute the percent-encoded query into the URL template.
    pub fn url_for(&self, query: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        self.url_template.replace("{query}", &encoded)
    }
}

/// Read-only set of targets for one scan. Shared by every session.
#[derive(Debug, Clone)]
pub struct Registry {
    targets: Vec<TargetSite>,
}

impl Registry {
    pub fn new(targets: Vec<TargetSite>) -> Self {
        Self { targets }
    }

    /// The built-in catalogue.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_TARGETS.to_vec())
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Targets belonging to one category, in catalogue order.
    pub fn targets_of(&self, category: TargetCategory) -> Vec<TargetSite> {
        self.targets
            .iter()
            .filter(|t| t.category == category)
            .copied()
            .collect()
    }

    pub fn targets(&self) -> &[TargetSite] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Built-in catalogue
// ---------------------------------------------------------------------------

const BUILTIN_TARGETS: &[TargetSite] = &[
    // General dark web search engines
    TargetSite {
        name: "Ahmia",
        url_template: "http://juhanurmihxlp77nkq76byazcldy2hlmovfu2epvl5ankdibsot4csyd.onion/search?q={query}",
        category: TargetCategory::General,
        description: "One of the most reliable dark web search engines that indexes .onion pages. Can be used to search for leaks.",
    },
    TargetSite {
        name: "Torch",
        url_template: "http://xmh57jrknzkhv6y3ls3ubitzfqnkrwxhopf5aygthi7d6rplyvk3noyd.onion/search?q={query}",
        category: TargetCategory::General,
        description: "One of the largest .onion search engines, indexes many hidden services.",
    },
    TargetSite {
        name: "Haystak",
        url_template: "http://haystak5njsmn2hqkewecpaxetahtwhsbsa64jom2k22z5afxhnpxfid.onion/search?q={query}",
        category: TargetCategory::General,
        description: "A deep index of .onion sites, useful for finding hidden leak pages.",
    },
    TargetSite {
        name: "Deep Search",
        url_template: "http://search7tdrcvri22rieiwgi5g46qnwsesvnubqav2xakhezv4hjzkkad.onion/search?q={query}",
        category: TargetCategory::General,
        description: "A reliable search engine that indexes .onion sites in a more structured way.",
    },
    TargetSite {
        name: "TorDex",
        url_template: "http://tordexyb63aknnvuzyqabeqx6l7zdiesfos22nisv6zbj6c6o3h6ijyd.onion/search?q={query}",
        category: TargetCategory::General,
        description: "A search engine specifically for .onion domains.",
    },
    // Breach databases
    TargetSite {
        name: "OnionSearch",
        url_template: "http://onionsearchservlty4vzd4z6s2nqwe5vt2vqspj46sw36w3b3xrsd77yd.onion/search?q={query}",
        category: TargetCategory::Breach,
        description: "A search engine specialized in finding breach dumps and leaked data on the dark web.",
    },
    TargetSite {
        name: "Hacked Emails Lookup",
        url_template: "http://hackedemailsb4dnvmaic55h5kqgmoylye6s3vczhj4zzb62adttyd.onion/search?q={query}",
        category: TargetCategory::Breach,
        description: "Lets you check if an email address appears in a known breach dump.",
    },
    TargetSite {
        name: "IntelX Dark Web Search",
        url_template: "http://kuddyrdtftnkgzmlmbmxlizwi77h3zxtom5vgu65cmxkrxnpxhv6toyd.onion/search?q={query}",
        category: TargetCategory::Breach,
        description: "Search engine indexing leaked credentials and sensitive documents.",
    },
    TargetSite {
        name: "DarkBing",
        url_template: "http://darkbing7mfomaavciwltpnuwtv7bymjsoaj5ltkjqizdcwvwma6tyd.onion/search?q={query}",
        category: TargetCategory::Breach,
        description: "Focuses on breached databases, often including credential leaks.",
    },
    // Marketplaces for stolen data
    TargetSite {
        name: "Brian's Club",
        url_template: "http://briansclcfyc5xpe73xlvwsujp2ujlg7wdm7vkk33wv4b75yhyzdwioyd.onion/search?q={query}",
        category: TargetCategory::Market,
        description: "One of the largest stolen credit card markets, frequently targeted by law enforcement.",
    },
    TargetSite {
        name: "BidenCash",
        url_template: "http://bidencash7srks2wmb6ksmow4ktswio7l2w6we4pycicnww2dfjzzkyd.onion/search?q={query}",
        category: TargetCategory::Market,
        description: "Stolen credit card and banking data; occasionally releases free leaks.",
    },
    TargetSite {
        name: "Russian Market",
        url_template: "http://russianmarketuvklb5p4rhwnrrn3kyooyhlf52fsbvfr3yp5u3zy67cid.onion/search?q={query}",
        category: TargetCategory::Market,
        description: "Specializes in hacked PayPal accounts, bank logs, and financial credentials.",
    },
    TargetSite {
        name: "AllWorld.Cards",
        url_template: "http://awcardsybzcmmzqkbzmwfwjht7x6tupvrz6foztfuowumgi2bq5joiqd.onion/search?q={query}",
        category: TargetCategory::Market,
        description: "Stolen credit cards and bank account credentials, with occasional public leaks.",
    },
    // Ransomware leak sites
    TargetSite {
        name: "ALPHV (BlackCat) Ransomware Leaks",
        url_template: "http://alphvmmf3wzhvf5ty7yqgt5hcbqfndfqkrbsllhncjh6sziqfrp4j5yd.onion/posts?q={query}",
        category: TargetCategory::Ransomware,
        description: "A ransomware gang that leaks stolen corporate and user data.",
    },
    TargetSite {
        name: "LockBit Leaks",
        url_template: "http://lockbitdrja3rx4ffxvqhbwx5jbf5xckie6mnb2zvvykv5qdmgbt3mad.onion/search?q={query}",
        category: TargetCategory::Ransomware,
        description: "One of the most active ransomware gangs publishing corporate and personal data leaks.",
    },
    TargetSite {
        name: "Medusa Blog",
        url_template: "http://medusa5j6xjwp7qopuwjrnvbhnqcxj2bg3tntcz7plhkjlgbhfc3dyd.onion/search?q={query}",
        category: TargetCategory::Ransomware,
        description: "Leaks company databases including user account info from hacked companies.",
    },
    // Forums where leaked data is shared
    TargetSite {
        name: "BreachForums (Rebuilt)",
        url_template: "http://breachforums76tdp26mpxvc2wr5edfg4eqme6d6uhc7gbkr46iyd.onion/search?q={query}",
        category: TargetCategory::Forum,
        description: "A revival of the BreachForums site, where stolen data is shared and sold.",
    },
    TargetSite {
        name: "Exploit Forum",
        url_template: "http://exploit5f5zhr53ntuvkaigc2yaz7xuf7rohtdqvvy6hwgvlba2vid.onion/search?q={query}",
        category: TargetCategory::Forum,
        description: "A Russian hacking forum with stolen logins, bank access, and exploits.",
    },
    TargetSite {
        name: "XSS Forum",
        url_template: "http://xss6al27uwo2o2ry4br6bkyrvye24jdu5p2twe5hhlkivwdn7xil7iid.onion/search?q={query}",
        category: TargetCategory::Forum,
        description: "A hacking and data trading forum, often has leaks from major breaches.",
    },
    // Anonymous paste sites
    TargetSite {
        name: "Doxbin",
        url_template: "http://doxbinwruaxknfyzxzwbjxb6vvf7uukpzbhdeqrzg6qtp7zrvl6vmyyd.onion/search?q={query}",
        category: TargetCategory::Paste,
        description: "A notorious doxing site containing personal data leaks, passwords, and addresses.",
    },
    TargetSite {
        name: "DeepPaste",
        url_template: "http://deeppastezxi2xmnznwfxcmmoi3nn5udl6dgsqk3pzu3uk2p4qmyd.onion/search?q={query}",
        category: TargetCategory::Paste,
        description: "A pastebin-style site where leaked passwords and databases appear.",
    },
    TargetSite {
        name: "OnionPaste",
        url_template: "http://onionpastemw3tcypztu3h7hnm4zzir2d4qvc7e6w3ly2xekrdufnjyid.onion/search?q={query}",
        category: TargetCategory::Paste,
        description: "Another anonymous pasting service, often used for sharing stolen credentials.",
    },
    // No specialized search services are currently catalogued; the category
    // exists so a future entry lands in an already-wired scan phase.
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalogue_has_expected_shape() {
        let registry = Registry::builtin();
        assert_eq!(registry.len(), 22);
        assert_eq!(registry.targets_of(TargetCategory::General).len(), 5);
        assert_eq!(registry.targets_of(TargetCategory::Breach).len(), 4);
        assert_eq!(registry.targets_of(TargetCategory::Market).len(), 4);
        assert_eq!(registry.targets_of(TargetCategory::Ransomware).len(), 3);
        assert_eq!(registry.targets_of(TargetCategory::Forum).len(), 3);
        assert_eq!(registry.targets_of(TargetCategory::Paste).len(), 3);
        assert_eq!(registry.targets_of(TargetCategory::Specialized).len(), 0);
    }

    #[test]
    fn every_builtin_template_has_query_placeholder() {
        for target in Registry::builtin().targets() {
            assert!(
                target.url_template.contains("{query}"),
                "{} template is missing the placeholder",
                target.name
            );
            assert!(
                target.url_template.contains(".onion"),
                "{} is not an onion address",
                target.name
            );
        }
    }

    #[test]
    fn url_for_percent_encodes_the_query() {
        let site = TargetSite {
            name: "Test",
            url_template: "http://example.onion/search?q={query}",
            category: TargetCategory::General,
            description: "",
        };
        assert_eq!(
            site.url_for("user@example.com"),
            "http://example.onion/search?q=user%40example.com"
        );
        // Spaces become plus signs under form encoding.
        assert_eq!(
            site.url_for("john doe"),
            "http://example.onion/search?q=john+doe"
        );
    }

    #[test]
    fn category_subsets_preserve_catalogue_order() {
        let registry = Registry::builtin();
        let general: Vec<&str> = registry
            .targets_of(TargetCategory::General)
            .iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(
            general,
            vec!["Ahmia", "Torch", "Haystak", "Deep Search", "TorDex"]
        );
    }

    #[test]
    fn builtin_names_are_unique() {
        let registry = Registry::builtin();
        let mut names: Vec<&str> = registry.targets().iter().map(|t| t.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), registry.len());
    }
}
