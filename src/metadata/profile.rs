#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Institutional constants attached to every file.
/// All fields are mandatory: an empty field fails the
/// metadata resolution rather than being written as is.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MetadataProfile {
    pub summary: String,
    pub keywords: String,
    pub keywords_vocabulary: String,
    pub source: String,
    pub institution: String,
    pub creator_type: String,
    pub creator_name: String,
    pub creator_email: String,
    pub creator_url: String,
    pub project: String,
    pub license: String,
    pub iso_topic_category: String,
    pub activity_type: String,
    pub operational_status: String,
}

impl Default for MetadataProfile {
    /// CRIOS project profile, University of Silesia.
    fn default() -> Self {
        Self {
            summary: "Satellite positioning fixes of a SPICE station together with its \
                      representative location. SPICE stations and their data are a part \
                      of the CRIOS project."
                .to_string(),
            keywords: "EARTH SCIENCE > CRYOSPHERE > SNOW/ICE > SNOW DEPTH,\
                       EARTH SCIENCE SERVICES > DATA ANALYSIS AND VISUALIZATION > \
                       GEOGRAPHIC INFORMATION SYSTEMS"
                .to_string(),
            keywords_vocabulary: "GCMD Science Keywords".to_string(),
            source: "GNSS position fixes reported by the station".to_string(),
            institution: "University of Silesia".to_string(),
            creator_type: "person".to_string(),
            creator_name: "Łukasz Małarzewski".to_string(),
            creator_email: "lukasz.malarzewski@us.edu.pl".to_string(),
            creator_url: "https://us.edu.pl/instytut/inoz/en/osoby/malarzewski-lukasz/"
                .to_string(),
            project: "CRIOS".to_string(),
            license: "https://spdx.org/licenses/CC-BY-4.0 (CC-BY-4.0)".to_string(),
            iso_topic_category: "location".to_string(),
            activity_type: "In Situ Land-based station".to_string(),
            operational_status: "Operational".to_string(),
        }
    }
}
