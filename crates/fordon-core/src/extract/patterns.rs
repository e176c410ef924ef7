//! Regex patterns for Norwegian vehicle policy documents.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Norwegian plates: two letters and 4-5 digits, OCR may split the digits
    pub static ref PLATE: Regex = Regex::new(
        r"(?i)^([A-Z]{2})\s?(\d(?:\s?\d){3,4})\b"
    ).unwrap();

    // A line holding nothing but a plate, as in overviews and table cells
    pub static ref BARE_PLATE: Regex = Regex::new(
        r"^[A-Z]{2}\s?\d(?:\s?\d){3,4}$"
    ).unwrap();

    pub static ref UNREGISTERED: Regex = Regex::new(
        r"(?i)^(?:uregistrert|ureg\.?)(?:\s|$)"
    ).unwrap();

    // Amounts: "20 000", "350.000", "4 000,00", "12000"
    pub static ref AMOUNT_VALUE: Regex = Regex::new(
        r"^(\d{1,3}(?:[ .]\d{3})+|\d+)(?:,(\d{1,2}))?$"
    ).unwrap();

    pub static ref CURRENCY_TOKEN: Regex = Regex::new(
        r"(?i)\b(?:kr|nok)\b\.?|,-|\.-"
    ).unwrap();

    pub static ref MILEAGE_UNIT: Regex = Regex::new(
        r"(?i)\b(?:km|kilometer)\b(?:\s*(?:/|pr\.?|per)\s*år)?\.?"
    ).unwrap();

    pub static ref BONUS_PERCENT: Regex = Regex::new(
        r"(\d{1,3})\s*%"
    ).unwrap();

    // "Klasse 7", "bonusklasse 12"
    pub static ref BONUS_CLASS: Regex = Regex::new(
        r"(?i)klasse\s*(\d{1,2})\b"
    ).unwrap();

    // Table captions that a "Dekning" label picks up in coverage tables
    pub static ref COVERAGE_HEADER: Regex = Regex::new(
        r"(?i)vilk(?:år|ar)|forsikringssum|egenandel|\bpris\b"
    ).unwrap();

    pub static ref MODEL_YEAR: Regex = Regex::new(
        r"(?i)(?:å|a)rsmodell\s*:?\s*((?:19|20)\d{2})\b"
    ).unwrap();

    // If: "PR59518, Varebil, Volkswagen Transporter"
    pub static ref IF_HEADING: Regex = Regex::new(
        r"(?i)^(?P<reg>[A-Z]{2}\s?\d{4,5})\s*,\s*(?P<type>[A-Za-zÆØÅæøå .]+?)\s*,\s*(?P<make>[^,]+?)(?:\s+Pris\b.*|\s+\d.*)?$"
    ).unwrap();

    // Gjensidige: "VOLKSWAGEN TRANSPORTER 2020 BU 21895"
    pub static ref GJENSIDIGE_CAR: Regex = Regex::new(
        r"^(?P<model>[A-ZÆØÅ][\w .()/\-]*?)\s+(?P<year>(?:19|20)\d{2})\s+(?P<reg>[A-Z]{2}\s?\d(?:\s?\d){3,4})$"
    ).unwrap();

    // Gjensidige vehicle table: "VOLVO XC60 AB 12345 2020 Ja 8 400"
    pub static ref GJENSIDIGE_TABLE_ROW: Regex = Regex::new(
        r"(?i)^(?P<brand>MERCEDES-BENZ|MERCEDES|LAND ROVER|VOLKSWAGEN|FORD|TOYOTA|CITROEN|PEUGEOT|VOLVO|BMW|AUDI|NISSAN|RENAULT|OPEL|FIAT|IVECO|MAN|SCANIA|SKODA|HYUNDAI|KIA|MAZDA|MITSUBISHI|SUZUKI|ISUZU|TESLA|POLESTAR|BYD|MG|SEAT|MINI)\s+(?P<rest>.+)$"
    ).unwrap();

    // Plate inside a table row; upper-case letters only so "Ja 8 400" is not one
    pub static ref PLATE_TOKEN: Regex = Regex::new(
        r"\b[A-Z]{2}\s?\d(?:\s?\d){3,4}\b"
    ).unwrap();

    pub static ref YEAR_TOKEN: Regex = Regex::new(
        r"\b(?:19|20)\d{2}\b"
    ).unwrap();

    // Gjensidige: "Uregistrert traktor og arb.maskin - Doosan 300 DX 2023 - 24 741 Uregistrert"
    pub static ref GJENSIDIGE_TRACTOR: Regex = Regex::new(
        r"(?i)^uregistrert\s+traktor\s+og\s+arb\.?\s*maskin\s*-\s*(?P<model>.+?)(?:\s*-\s*[\d ]*(?:uregistrert)?)?$"
    ).unwrap();

    // Gjensidige: "Maskinløsøre - MASKINLØSØRE 2024 - 62 324 Uregistrert"
    pub static ref GJENSIDIGE_MACHINERY: Regex = Regex::new(
        r"(?i)^maskinl[øo0@]s[øo0@]re\s*-\s*(?P<label>.+?)(?:\s*-\s*[\d ]*(?:uregistrert)?)?$"
    ).unwrap();

    // Tryg: "Personbil - Vilkår PAU18100", "Campingvogn og tilhenger - Vilkår CAM18100"
    pub static ref TRYG_HEADING: Regex = Regex::new(
        r"(?i)^(?P<product>(?:Motorvogn|Personbil|Varebil|Lastebil|Campingvogn og tilhenger|Tilhenger|Traktor|Moped|Motorsykkel|Snøscooter|Båt)\b.*?)\s*-\s*Vilk(?:år|ar|\?r|r)\s+[A-Z]{2,4}\d+"
    ).unwrap();

    // Tryg overview: the product on its own line, followed by the plate
    pub static ref TRYG_PRODUCT: Regex = Regex::new(
        r"(?i)^(?P<product>Motorvogn|Personbil|Varebil|Lastebil|Campingvogn og tilhenger|Tilhenger|Traktor|Arbeidsmaskiner?|Moped|Motorsykkel|Snøscooter)$"
    ).unwrap();

    pub static ref TRYG_TYPE: Regex = Regex::new(
        r"(?i)^Type\s*[:\-]?\s*(?P<type>[A-Za-zÆØÅæøå][A-Za-zÆØÅæøå .\-]*)$"
    ).unwrap();

    pub static ref TRYG_BLOCK_END: Regex = Regex::new(
        r"(?i)^(?:Forsikringsbevis\s*\|\s*Spesifikasjon|Avtalenummer\b|Side\s+\d+\s+av\s+\d+)"
    ).unwrap();

    // Tryg coverage table: "Kasko PAU18255 20 000 6 000 968"
    pub static ref TRYG_COVERAGE_ROW: Regex = Regex::new(
        r"(?i)^(?P<coverage>Kasko|Delkasko|Ansvar|Brann|Tyveri|Glass|Redning)\s+(?:[A-Z]{2,5}\d+\s+)?(?P<sum>\d{1,3}(?: \d{3})+|\d{3,7})\s+(?P<deductible>\d{1,3}(?: \d{3})+|\d{1,7})\s+(?P<premium>\d{1,3}(?: \d{3})+|\d{1,7})\b"
    ).unwrap();

    pub static ref LEASING_COMPANIES: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"(?i)\bsparebank\s*1\b").unwrap(), "Sparebank 1"),
        (Regex::new(r"(?i)\bnordea\s+finans\b").unwrap(), "Nordea Finans"),
        (Regex::new(r"(?i)\bsantander\b").unwrap(), "Santander"),
        (Regex::new(r"(?i)\bdnb\s+finans\b").unwrap(), "DNB Finans"),
        (Regex::new(r"(?i)\bbrage\s+finans\b").unwrap(), "BRAGE FINANS"),
        (Regex::new(r"(?i)\bhandelsbanken\b").unwrap(), "Handelsbanken"),
        (Regex::new(r"(?i)\bbn\s+bank\b").unwrap(), "BN Bank"),
    ];
}

/// First known finance company named in `lines`.
pub fn find_leasing_company<S: AsRef<str>>(lines: &[S]) -> Option<&'static str> {
    lines.iter().find_map(|line| {
        LEASING_COMPANIES
            .iter()
            .find(|(pattern, _)| pattern.is_match(line.as_ref()))
            .map(|(_, name)| *name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_if_heading() {
        let caps = IF_HEADING
            .captures("PR59518, Varebil, Volkswagen Transporter Pris 12 345")
            .unwrap();
        assert_eq!(&caps["reg"], "PR59518");
        assert_eq!(&caps["type"], "Varebil");
        assert_eq!(&caps["make"], "Volkswagen Transporter");
    }

    #[test]
    fn test_gjensidige_headings() {
        let caps = GJENSIDIGE_CAR.captures("VOLKSWAGEN TRANSPORTER 2020 BU 21895").unwrap();
        assert_eq!(&caps["model"], "VOLKSWAGEN TRANSPORTER");
        assert_eq!(&caps["year"], "2020");
        assert_eq!(&caps["reg"], "BU 21895");

        let caps = GJENSIDIGE_TRACTOR
            .captures("Uregistrert traktor og arb.maskin - Doosan 300 DX 2023 - 24 741 Uregistrert")
            .unwrap();
        assert_eq!(&caps["model"], "Doosan 300 DX 2023");

        let caps = GJENSIDIGE_MACHINERY
            .captures("MASKINL@S@RE - MASKINLØSØRE 2024 - 62 324 Uregistrert")
            .unwrap();
        assert_eq!(&caps["label"], "MASKINLØSØRE 2024");
    }

    #[test]
    fn test_gjensidige_table_row() {
        let caps = GJENSIDIGE_TABLE_ROW.captures("MERCEDES-BENZ SPRINTER AB 12345 2021").unwrap();
        assert_eq!(&caps["brand"], "MERCEDES-BENZ");
        assert_eq!(&caps["rest"], "SPRINTER AB 12345 2021");
        assert!(GJENSIDIGE_TABLE_ROW.captures("MANUELL KJØRING").is_none());

        let plates: Vec<_> = PLATE_TOKEN.find_iter("XC60 AB 12345 2020 Ja 8 400").map(|m| m.as_str()).collect();
        assert_eq!(plates, vec!["AB 12345"]);
    }

    #[test]
    fn test_tryg_heading() {
        let caps = TRYG_HEADING
            .captures("Campingvogn og tilhenger - Vilkår CAM18100")
            .unwrap();
        assert_eq!(&caps["product"], "Campingvogn og tilhenger");
        assert!(TRYG_HEADING.is_match("Personbil - Vilk?r PAU18100"));
        assert!(!TRYG_HEADING.is_match("Personbil"));
    }

    #[test]
    fn test_tryg_overview_lines() {
        assert!(TRYG_PRODUCT.is_match("Campingvogn og tilhenger"));
        assert!(TRYG_PRODUCT.is_match("Arbeidsmaskiner"));
        assert!(!TRYG_PRODUCT.is_match("Personbil - Vilkår PAU18100"));

        assert!(BARE_PLATE.is_match("KR3037"));
        assert!(BARE_PLATE.is_match("AB 12345"));
        assert!(!BARE_PLATE.is_match("Kjennemerke: AB12345"));
        assert!(!BARE_PLATE.is_match("PAU18100"));
        assert!(!BARE_PLATE.is_match("968"));
    }

    #[test]
    fn test_tryg_coverage_row() {
        let caps = TRYG_COVERAGE_ROW.captures("Kasko PAU18255 20 000 6 000 968").unwrap();
        assert_eq!(&caps["coverage"], "Kasko");
        assert_eq!(&caps["sum"], "20 000");
        assert_eq!(&caps["deductible"], "6 000");
        assert_eq!(&caps["premium"], "968");

        let caps = TRYG_COVERAGE_ROW.captures("Delkasko 350 000 4 000 5 200").unwrap();
        assert_eq!(&caps["sum"], "350 000");
        assert_eq!(&caps["deductible"], "4 000");
    }

    #[test]
    fn test_find_leasing_company() {
        let lines = ["VOLVO XC60 2020 AB 12345", "- Sparebank 1 Sør-Norge ASA"];
        assert_eq!(find_leasing_company(&lines), Some("Sparebank 1"));
        assert_eq!(find_leasing_company(&["Ingen panthaver"]), None);
    }
}
