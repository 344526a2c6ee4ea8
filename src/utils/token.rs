use rand::Rng;

/// Gera o código numérico de 6 dígitos enviado por email
pub fn generate_token() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

pub fn is_numeric_token(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}
