// City name -> IATA code lookup for the search forms

const IATA_CODES: &[(&str, &str)] = &[
    ("bogota", "BOG"),
    ("medellin", "MDE"),
    ("cali", "CLO"),
    ("cartagena", "CTG"),
    ("barranquilla", "BAQ"),
    ("bucaramanga", "BGA"),
    ("leticia", "LET"),
    ("armenia", "AXM"),
    ("pereira", "PEI"),
    ("pasto", "PSO"),
    ("popayan", "PPN"),
    ("santa marta", "SMR"),
    ("monteria", "MTR"),
    ("riohacha", "RCH"),
    ("mitu", "MVP"),
    ("ibague", "IBE"),
    ("neiva", "NVA"),
    ("san andres", "ADZ"),
    ("punta cana", "PUJ"),
    ("cancun", "CUN"),
];

/// Lowercases, trims and strips Spanish diacritics ("Bogotá" -> "bogota").
pub fn normalize_city(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' => 'a',
            'é' | 'è' | 'ë' => 'e',
            'í' | 'ì' | 'ï' => 'i',
            'ó' | 'ò' | 'ö' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

pub fn iata_code(name: &str) -> Option<&'static str> {
    let key = normalize_city(name);
    IATA_CODES
        .iter()
        .find(|(city, _)| *city == key)
        .map(|(_, code)| *code)
}

/// IATA code when the city is known, otherwise the input as typed.
pub fn airport_or_name(name: &str) -> String {
    iata_code(name)
        .map(str::to_string)
        .unwrap_or_else(|| name.trim().to_string())
}
