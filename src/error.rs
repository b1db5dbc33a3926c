use thiserror::Error;

/// Erreurs remontées par les pilotes de capteurs
#[derive(Debug, Error)]
pub enum Error {
    /// Bus ou périphérique injoignable, jamais ré-essayé par la couche transport
    #[error("Défaut de transport I2C (adresse {address:#04x}, registre {register:#04x}): {cause}")]
    TransportFault {
        address: u8,
        register: u8,
        cause: String,
    },

    /// Le registre d'identité ne correspond pas au composant attendu
    #[error("Identité du composant invalide: attendu {expected:#04x}, lu {found:#04x}")]
    IdentityMismatch { expected: u8, found: u8 },

    /// La calibration NVM n'est pas prête après le nombre d'essais autorisé
    #[error("Composant non prêt après {attempts} essais")]
    DeviceNotReady { attempts: u8 },

    /// Valeur de configuration hors des tables ou des bornes reconnues
    #[error("Paramètre invalide: {0}")]
    InvalidParameter(String),

    /// Dénominateur nul ou pression hors domaine pendant la compensation, l'échantillon doit être ignoré
    #[error("Singularité de calcul pendant la compensation")]
    ComputationSingularity,

    /// Opération demandée alors que le pilote n'est pas dans l'état requis
    #[error("État du pilote invalide: {0}")]
    InvalidState(&'static str),
}

impl Error {
    /// Vrai si l'erreur est fatale par nature (identité, calibration).
    /// Toute erreur survenue pendant `init` laisse de toute façon le pilote en échec.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::IdentityMismatch { .. } | Error::DeviceNotReady { .. })
    }
}

pub type Result<T> = core::result::Result<T, Error>;
