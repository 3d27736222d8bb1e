use dochub_common::Vnd;
use url::Url;

use crate::{SepayApiError, SepayConfig};

/// SePay reports đồng amounts as decimal strings with a zero fractional part ("50000.00"). Only the whole-đồng part
/// carries information; a non-numeric token is an error rather than a zero.
pub fn parse_vnd_amount(amount: &str) -> Result<Vnd, SepayApiError> {
    let mut parts = amount.trim().split('.');
    let whole_units = parts
        .next()
        .ok_or_else(|| SepayApiError::InvalidCurrencyAmount(amount.to_string()))?
        .parse::<i64>()
        .map_err(|e| SepayApiError::InvalidCurrencyAmount(format!("Invalid amount value: {amount}. {e}.")))?;
    if let Some(frac) = parts.next() {
        if !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(SepayApiError::InvalidCurrencyAmount(amount.to_string()));
        }
    }
    Ok(Vnd::from(whole_units))
}

/// The QR image link shown next to the bank details. The reference goes through the query-pair encoder because a
/// virtual-account prefixed reference contains a space.
pub fn qr_image_url(config: &SepayConfig, amount: Vnd, reference: &str) -> Result<String, SepayApiError> {
    let url = Url::parse_with_params(&config.qr_base, &[
        ("acc", config.bank_account.as_str()),
        ("bank", config.bank_name.as_str()),
        ("amount", amount.value().to_string().as_str()),
        ("des", reference),
    ])
    .map_err(|e| SepayApiError::InvalidUrl(format!("{}: {e}", config.qr_base)))?;
    Ok(url.to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn amounts_parse_with_and_without_fraction() {
        assert_eq!(parse_vnd_amount("50000").unwrap(), Vnd::from(50_000));
        assert_eq!(parse_vnd_amount("50000.00").unwrap(), Vnd::from(50_000));
        assert_eq!(parse_vnd_amount(" 125000.0 ").unwrap(), Vnd::from(125_000));
    }

    #[test]
    fn junk_amounts_are_rejected() {
        assert!(parse_vnd_amount("").is_err());
        assert!(parse_vnd_amount("fifty").is_err());
        assert!(parse_vnd_amount("50000.x0").is_err());
    }

    #[test]
    fn qr_url_encodes_the_reference() {
        let config = SepayConfig {
            bank_account: "9924666".to_string(),
            bank_name: "ACB".to_string(),
            ..Default::default()
        };
        let url = qr_image_url(&config, Vnd::from(56_000), "VA88231 DH1A2B3C4D").unwrap();
        assert!(url.starts_with("https://qr.sepay.vn/img?"));
        assert!(url.contains("acc=9924666"));
        assert!(url.contains("bank=ACB"));
        assert!(url.contains("amount=56000"));
        // No raw space may survive in the query string.
        assert!(!url.contains(' '));
        assert!(url.contains("des=VA88231+DH1A2B3C4D") || url.contains("des=VA88231%20DH1A2B3C4D"));
    }
}
