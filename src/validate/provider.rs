use std::net::Ipv4Addr;

/// Hosting provider label for an address.
///
/// No geolocation or ASN data is consulted; every address gets the same
/// placeholder so the field is populated for alive hosts.
pub fn lookup_provider(_ip: &Ipv4Addr) -> String {
    "Unknown".to_string()
}
