//! Calibration regions for the displacement impact function.
//!
//! Each country belongs to one region, and each region has its own fitted `v_half` for the Emanuel
//! impact function.

/// A calibration region and the countries (ISO3) in it.
#[derive(Debug)]
pub struct Basin {
    pub name: &'static str,
    pub v_half: f64,
    pub countries: &'static [&'static str],
}

pub static BASINS: &[Basin] = &[
    Basin {
        name: "NA1",
        v_half: 51.6,
        countries: &[
            "AIA", "ATG", "ARG", "ABW", "BHS", "BRB", "BLZ", "BMU", "BOL", "CPV", "CYM", "CHL",
            "COL", "CRI", "CUB", "DMA", "DOM", "ECU", "SLV", "FLK", "GUF", "GRD", "GLP", "GTM",
            "GUY", "HTI", "HND", "JAM", "MTQ", "MEX", "MSR", "NIC", "PAN", "PRY", "PER", "PRI",
            "SHN", "KNA", "LCA", "VCT", "SXM", "SUR", "TTO", "TCA", "URY", "VEN", "VGB", "VIR",
        ],
    },
    Basin {
        name: "NA2",
        v_half: 84.1,
        countries: &["CAN", "USA"],
    },
    Basin {
        name: "NI",
        v_half: 41.3,
        countries: &[
            "AFG", "ARM", "AZE", "BHR", "BGD", "BTN", "DJI", "ERI", "ETH", "GEO", "IND", "IRN",
            "IRQ", "ISR", "JOR", "KAZ", "KWT", "KGZ", "LBN", "MDV", "MNG", "MMR", "NPL", "OMN",
            "PAK", "QAT", "SAU", "SOM", "LKA", "SYR", "TJK", "TKM", "UGA", "ARE", "UZB", "YEM",
        ],
    },
    Basin {
        name: "OC1",
        v_half: 44.3,
        countries: &[
            "ASM", "COK", "FJI", "PYF", "GUM", "KIR", "MHL", "FSM", "NRU", "NCL", "NIU", "NFK",
            "MNP", "PLW", "PNG", "PCN", "WSM", "SLB", "TLS", "TKL", "TON", "TUV", "VUT", "WLF",
        ],
    },
    Basin {
        name: "OC2",
        v_half: 47.4,
        countries: &["AUS", "NZL"],
    },
    Basin {
        name: "SI",
        v_half: 40.8,
        countries: &[
            "COM", "COD", "SWZ", "MDG", "MWI", "MLI", "MUS", "MOZ", "ZAF", "TZA", "ZWE",
        ],
    },
    Basin {
        name: "WP1",
        v_half: 42.2,
        countries: &["KHM", "IDN", "LAO", "MYS", "THA", "VNM"],
    },
    Basin {
        name: "WP2",
        v_half: 46.7,
        countries: &["PHL"],
    },
    Basin {
        name: "WP3",
        v_half: 35.7,
        countries: &["CHN"],
    },
    Basin {
        name: "WP4",
        v_half: 93.1,
        countries: &["HKG", "JPN", "KOR", "MAC", "TWN"],
    },
    Basin {
        name: "ROW",
        v_half: 49.5,
        countries: &[
            "ALB", "DZA", "AND", "AGO", "ATA", "AUT", "BLR", "BEL", "BEN", "BES", "BIH", "BWA",
            "BVT", "BRA", "IOT", "BRN", "BGR", "BFA", "BDI", "CMR", "CAF", "TCD", "CXR", "CCK",
            "COG", "HRV", "CUW", "CYP", "CZE", "CIV", "DNK", "EGY", "GNQ", "EST", "FRO", "FIN",
            "FRA", "ATF", "GAB", "GMB", "DEU", "GHA", "GIB", "GRC", "GRL", "GGY", "GIN", "GNB",
            "HMD", "VAT", "HUN", "ISL", "IRL", "IMN", "ITA", "JEY", "KEN", "PRK", "XKX", "LVA",
            "LSO", "LBR", "LBY", "LIE", "LTU", "LUX", "MLT", "MRT", "MYT", "MDA", "MCO", "MNE",
            "MAR", "NAM", "NLD", "NER", "NGA", "MKD", "NOR", "PSE", "POL", "PRT", "ROU", "RUS",
            "RWA", "REU", "BLM", "MAF", "SPM", "SMR", "STP", "SEN", "SRB", "SYC", "SLE", "SGP",
            "SVK", "SVN", "SGS", "SSD", "ESP", "SDN", "SJM", "SWE", "CHE", "TGO", "TUN", "TUR",
            "UKR", "GBR", "UMI", "ESH", "ZMB", "ALA",
        ],
    },
];

/// The calibration region a country belongs to. Case insensitive.
pub fn basin_for(iso3: &str) -> Option<&'static Basin> {
    let iso3 = iso3.to_uppercase();
    BASINS
        .iter()
        .find(|basin| basin.countries.contains(&iso3.as_str()))
}

/// The Emanuel `v_half` (m/s) fitted for the region a country is in.
pub fn v_half_for(iso3: &str) -> Option<f64> {
    basin_for(iso3).map(|basin| basin.v_half)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_lookups() {
        assert_eq!(basin_for("USA").map(|b| b.name), Some("NA2"));
        assert_eq!(v_half_for("USA"), Some(84.1));
        assert_eq!(v_half_for("phl"), Some(46.7));
        assert_eq!(v_half_for("CUB"), Some(51.6));
        assert_eq!(v_half_for("ZMB"), Some(49.5));
        assert_eq!(v_half_for("XXX"), None);
    }

    #[test]
    fn test_every_country_in_one_basin() {
        let mut seen = HashSet::new();
        for basin in BASINS {
            for country in basin.countries {
                assert_eq!(country.len(), 3);
                assert!(seen.insert(*country), "{} listed twice", country);
            }
        }
    }
}
