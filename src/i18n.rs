use serde::{Deserialize, Serialize};

/// 报告目标语言
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum TargetLanguage {
    #[serde(rename = "en")]
    #[default]
    English,
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "zh")]
    Chinese,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "de")]
    German,
    #[serde(rename = "pt")]
    Portuguese,
}

impl std::fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetLanguage::English => write!(f, "en"),
            TargetLanguage::Spanish => write!(f, "es"),
            TargetLanguage::Chinese => write!(f, "zh"),
            TargetLanguage::French => write!(f, "fr"),
            TargetLanguage::German => write!(f, "de"),
            TargetLanguage::Portuguese => write!(f, "pt"),
        }
    }
}

impl std::str::FromStr for TargetLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(TargetLanguage::English),
            "es" | "spanish" | "español" => Ok(TargetLanguage::Spanish),
            "zh" | "chinese" | "中文" => Ok(TargetLanguage::Chinese),
            "fr" | "french" | "français" => Ok(TargetLanguage::French),
            "de" | "german" | "deutsch" => Ok(TargetLanguage::German),
            "pt" | "portuguese" | "português" => Ok(TargetLanguage::Portuguese),
            _ => Err(format!("Unknown target language: {}", s)),
        }
    }
}

impl TargetLanguage {
    /// 获取语言的描述性名称
    pub fn display_name(&self) -> &'static str {
        match self {
            TargetLanguage::English => "English",
            TargetLanguage::Spanish => "Español",
            TargetLanguage::Chinese => "中文",
            TargetLanguage::French => "Français",
            TargetLanguage::German => "Deutsch",
            TargetLanguage::Portuguese => "Português",
        }
    }

    /// 获取语言的提示词指令，追加在每个Agent的系统提示词末尾
    pub fn prompt_instruction(&self) -> &'static str {
        match self {
            TargetLanguage::English => {
                "Write every free-text field of your answer in English. Keep JSON keys exactly as specified."
            }
            TargetLanguage::Spanish => {
                "Redacta en español todos los campos de texto libre de tu respuesta. Mantén las claves JSON exactamente como se especifican."
            }
            TargetLanguage::Chinese => "请使用中文填写回答中的所有自由文本字段，JSON键名必须保持原样。",
            TargetLanguage::French => {
                "Rédigez en français tous les champs de texte libre de votre réponse. Conservez les clés JSON exactement comme indiqué."
            }
            TargetLanguage::German => {
                "Schreiben Sie alle Freitextfelder Ihrer Antwort auf Deutsch. Behalten Sie die JSON-Schlüssel exakt wie angegeben bei."
            }
            TargetLanguage::Portuguese => {
                "Escreva em português todos os campos de texto livre da sua resposta. Mantenha as chaves JSON exatamente como especificado."
            }
        }
    }

    /// 报告中"研究方法"一栏的固定描述
    pub fn methodology_statement(&self) -> &'static str {
        match self {
            TargetLanguage::English => {
                "Multi-agent analysis with parallel interviews and source verification"
            }
            TargetLanguage::Spanish => {
                "Análisis multi-agente con procesamiento paralelo y verificación de fuentes"
            }
            TargetLanguage::Chinese => "多智能体分析，并行访谈与信源核查",
            TargetLanguage::French => {
                "Analyse multi-agents avec entretiens parallèles et vérification des sources"
            }
            TargetLanguage::German => {
                "Multi-Agenten-Analyse mit parallelen Interviews und Quellenprüfung"
            }
            TargetLanguage::Portuguese => {
                "Análise multiagente com entrevistas paralelas e verificação de fontes"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_language_default() {
        assert_eq!(TargetLanguage::default(), TargetLanguage::English);
    }

    #[test]
    fn test_target_language_from_str() {
        assert_eq!("es".parse::<TargetLanguage>().unwrap(), TargetLanguage::Spanish);
        assert_eq!("Español".parse::<TargetLanguage>().unwrap(), TargetLanguage::Spanish);
        assert_eq!("中文".parse::<TargetLanguage>().unwrap(), TargetLanguage::Chinese);
        assert_eq!("DE".parse::<TargetLanguage>().unwrap(), TargetLanguage::German);
        assert!("klingon".parse::<TargetLanguage>().is_err());
    }

    #[test]
    fn test_display_matches_serde_tag() {
        for lang in [
            TargetLanguage::English,
            TargetLanguage::Spanish,
            TargetLanguage::Chinese,
            TargetLanguage::French,
            TargetLanguage::German,
            TargetLanguage::Portuguese,
        ] {
            let json = serde_json::to_string(&lang).unwrap();
            assert_eq!(json, format!("\"{}\"", lang));
        }
    }

    #[test]
    fn test_prompt_instruction_not_empty() {
        assert!(TargetLanguage::Spanish.prompt_instruction().contains("JSON"));
        assert!(!TargetLanguage::Chinese.methodology_statement().is_empty());
    }

    #[test]
    fn test_display_name_is_native() {
        assert_eq!(TargetLanguage::Chinese.display_name(), "中文");
        assert_eq!(TargetLanguage::Portuguese.display_name(), "Português");
    }
}
