use clap::ValueEnum;
use serde::Serialize;
use std::fmt;

/// Every dataset the repository knows how to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    BigMac,
    BisReer,
    Numbeo,
    Penn,
    WbCpi,
    WbIcp,
}

/// Topic groupings used to browse the sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    PriceLevels,
    Inflation,
    ExchangeRates,
    Wages,
}

impl Source {
    pub const ALL: [Source; 6] = [
        Source::BigMac,
        Source::WbIcp,
        Source::Penn,
        Source::WbCpi,
        Source::BisReer,
        Source::Numbeo,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Source::BigMac => "The Economist – Big Mac Index",
            Source::BisReer => "BIS – Real Effective Exchange Rates (REER)",
            Source::Numbeo => "Numbeo – Cost of Living + PPP",
            Source::Penn => "Penn World Table",
            Source::WbCpi => "World Bank – CPI (Consumer Price Index)",
            Source::WbIcp => "World Bank – ICP Database",
        }
    }

    pub fn category(self) -> Category {
        match self {
            Source::BigMac | Source::WbIcp | Source::Penn => Category::PriceLevels,
            Source::WbCpi => Category::Inflation,
            Source::BisReer => Category::ExchangeRates,
            Source::Numbeo => Category::Wages,
        }
    }

    /// Prefix of CSV export file names.
    pub fn export_prefix(self) -> &'static str {
        match self {
            Source::BigMac => "big_mac",
            Source::BisReer => "bis_reer",
            Source::Numbeo => "numbeo",
            Source::Penn => "penn",
            Source::WbCpi => "wb_cpi",
            Source::WbIcp => "wb_icp",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::PriceLevels,
        Category::Inflation,
        Category::ExchangeRates,
        Category::Wages,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::PriceLevels => "Price Levels & PPP",
            Category::Inflation => "CPI & Inflation",
            Category::ExchangeRates => "Exchange Rates",
            Category::Wages => "Wages & Purchasing Power",
        }
    }

    /// Sources in this category, in browsing order.
    pub fn sources(self) -> Vec<Source> {
        Source::ALL
            .into_iter()
            .filter(|s| s.category() == self)
            .collect()
    }
}
