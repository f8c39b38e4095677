//! Exact Online data-center regions.

// self
use crate::_prelude::*;

/// Exact Online data center serving a division.
///
/// Every region runs its own OAuth 2.0 and REST hosts; the default endpoints of a
/// [`ProviderDescriptor`](crate::provider::ProviderDescriptor) are derived from it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Region {
	#[default]
	/// `start.exactonline.nl`.
	Netherlands,
	/// `start.exactonline.be`.
	Belgium,
	/// `start.exactonline.co.uk`.
	UnitedKingdom,
	/// `start.exactonline.de`.
	Germany,
	/// `start.exactonline.com`.
	UnitedStates,
	/// `start.exactonline.es`.
	Spain,
	/// `start.exactonline.fr`.
	France,
}
impl Region {
	/// All known regions.
	pub const ALL: [Region; 7] = [
		Region::Netherlands,
		Region::Belgium,
		Region::UnitedKingdom,
		Region::Germany,
		Region::UnitedStates,
		Region::Spain,
		Region::France,
	];

	/// Host name serving this region.
	pub const fn host(self) -> &'static str {
		match self {
			Region::Netherlands => "start.exactonline.nl",
			Region::Belgium => "start.exactonline.be",
			Region::UnitedKingdom => "start.exactonline.co.uk",
			Region::Germany => "start.exactonline.de",
			Region::UnitedStates => "start.exactonline.com",
			Region::Spain => "start.exactonline.es",
			Region::France => "start.exactonline.fr",
		}
	}

	/// Short label used in configuration (`nl`, `be`, `uk`, ...).
	pub const fn as_str(self) -> &'static str {
		match self {
			Region::Netherlands => "nl",
			Region::Belgium => "be",
			Region::UnitedKingdom => "uk",
			Region::Germany => "de",
			Region::UnitedStates => "us",
			Region::Spain => "es",
			Region::France => "fr",
		}
	}

	/// Default authorization endpoint.
	pub fn authorization_url(self) -> Url {
		self.url("/api/oauth2/auth")
	}

	/// Default token endpoint.
	pub fn token_url(self) -> Url {
		self.url("/api/oauth2/token")
	}

	/// Default REST API base.
	pub fn api_base_url(self) -> Url {
		self.url("/api/v1")
	}

	fn url(self, path: &str) -> Url {
		let raw = format!("https://{}{path}", self.host());

		Url::parse(&raw).unwrap_or_else(|e| unreachable!("static region URL `{raw}` must parse: {e}"))
	}
}
impl Display for Region {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Region {
	type Err = UnknownRegion;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Region::ALL
			.into_iter()
			.find(|region| region.as_str().eq_ignore_ascii_case(s))
			.ok_or_else(|| UnknownRegion(s.to_owned()))
	}
}

impl From<Region> for String {
	fn from(value: Region) -> Self {
		value.as_str().to_owned()
	}
}
impl TryFrom<String> for Region {
	type Error = UnknownRegion;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

/// Error returned when a region label is not recognized.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unknown Exact Online region `{0}`.")]
pub struct UnknownRegion(pub String);
